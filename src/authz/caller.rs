use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use super::principal::{Access, Caller};
use crate::app::AppState;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::jwt::ADMIN_ROLE_CLAIM;

pub const ADMIN_COOKIE: &str = "admin_token";
pub const EMPLOYEE_COOKIE: &str = "token";
pub const USER_ID_HEADER: &str = "x-user-id";

/// Work out who is calling from headers alone.
///
/// An admin assertion wins when it verifies and carries the admin role claim.
/// Otherwise the first employee declaration found is used: the `x-user-id`
/// header (when trusted), then a verified employee token from the `token`
/// cookie or a bearer header. `None` means unauthenticated.
pub fn identify(headers: &HeaderMap, config: &AppConfig) -> Option<Caller> {
    let jar = CookieJar::from_headers(headers);
    if let Some(username) = admin_assertion(&jar, config) {
        return Some(Caller::Admin { username });
    }

    employee_declaration(headers, &jar, config).map(|id| Caller::Employee { id })
}

fn admin_assertion(jar: &CookieJar, config: &AppConfig) -> Option<String> {
    let token = cookie_value(jar, ADMIN_COOKIE)?;
    let claims = config.jwt.decode_admin(token)?;

    if claims.role != ADMIN_ROLE_CLAIM {
        tracing::debug!(role = %claims.role, "admin cookie carries a non-admin role");
        return None;
    }

    Some(claims.username)
}

fn employee_declaration(headers: &HeaderMap, jar: &CookieJar, config: &AppConfig) -> Option<Uuid> {
    if let Some(raw) = header_str(headers, USER_ID_HEADER) {
        if config.identity.trust_user_id_header {
            match Uuid::parse_str(raw.trim()) {
                Ok(id) => {
                    tracing::debug!(employee_id = %id, "identity taken from x-user-id header");
                    return Some(id);
                }
                Err(_) => tracing::debug!("ignoring unparsable x-user-id header"),
            }
        } else {
            tracing::debug!("x-user-id header ignored, header identity disabled");
        }
    }

    let token = cookie_value(jar, EMPLOYEE_COOKIE)
        .map(str::to_string)
        .or_else(|| bearer_token(headers))?;
    config.jwt.decode_employee(&token).map(|claims| claims.id)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    header_str(headers, header::AUTHORIZATION.as_str())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn cookie_value<'a>(jar: &'a CookieJar, name: &str) -> Option<&'a str> {
    jar.get(name).map(|cookie| cookie.value()).filter(|value| !value.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        identify(&parts.headers, &state.config).ok_or_else(|| AppError::unauthorized("no valid identity"))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Access {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        Access::load(&state.pool, caller).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::PermissionSet;
    use crate::config::{AdminCredentials, IdentityPolicy};
    use crate::jwt::{AdminClaims, JwtConfig};
    use axum::http::HeaderValue;

    fn config(trust_header: bool) -> AppConfig {
        AppConfig {
            jwt: JwtConfig::new("test-secret", 1),
            admin: AdminCredentials::new("root", "rootpass1"),
            identity: IdentityPolicy {
                trust_user_id_header: trust_header,
                secure_cookies: false,
            },
        }
    }

    fn with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn verified_admin_cookie_identifies_admin() {
        let cfg = config(true);
        let token = cfg.jwt.encode_admin("root").unwrap();
        let headers = with_cookie(&format!("theme=dark; admin_token={token}"));

        assert_eq!(identify(&headers, &cfg), Some(Caller::Admin { username: "root".into() }));
    }

    #[test]
    fn admin_cookie_with_other_role_claim_is_ignored() {
        let cfg = config(true);
        let claims = AdminClaims {
            role: "Manager".into(),
            username: "root".into(),
            exp: (chrono::Utc::now().timestamp() + 600) as usize,
            iat: chrono::Utc::now().timestamp() as usize,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let headers = with_cookie(&format!("admin_token={token}"));
        assert_eq!(identify(&headers, &cfg), None);
    }

    #[test]
    fn tampered_admin_cookie_falls_through_to_employee_header() {
        let cfg = config(true);
        let id = Uuid::new_v4();
        let mut headers = with_cookie("admin_token=not-a-token");
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());

        assert_eq!(identify(&headers, &cfg), Some(Caller::Employee { id }));
    }

    #[test]
    fn header_identity_can_be_switched_off() {
        let cfg = config(false);
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap());

        assert_eq!(identify(&headers, &cfg), None);
    }

    #[test]
    fn unparsable_header_falls_back_to_employee_cookie() {
        let cfg = config(true);
        let id = Uuid::new_v4();
        let token = cfg
            .jwt
            .encode_employee(id, "ada@example.com", None, PermissionSet::none())
            .unwrap();
        let mut headers = with_cookie(&format!("token={token}"));
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("bob"));

        assert_eq!(identify(&headers, &cfg), Some(Caller::Employee { id }));
    }

    #[test]
    fn bearer_employee_token_is_accepted() {
        let cfg = config(false);
        let id = Uuid::new_v4();
        let token = cfg
            .jwt
            .encode_employee(id, "ada@example.com", Some("Lead"), PermissionSet::none())
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        assert_eq!(identify(&headers, &cfg), Some(Caller::Employee { id }));
    }

    #[test]
    fn no_credentials_is_unauthenticated() {
        assert_eq!(identify(&HeaderMap::new(), &config(true)), None);
    }

    #[test]
    fn cookie_lookup_matches_whole_names() {
        let jar = CookieJar::from_headers(&with_cookie("admin_token_old=x; token=abc"));
        assert_eq!(cookie_value(&jar, "token"), Some("abc"));
        assert_eq!(cookie_value(&jar, "admin_token"), None);
    }

    #[test]
    fn cleared_cookie_is_no_credential() {
        let cfg = config(false);
        assert_eq!(identify(&with_cookie("admin_token=; token="), &cfg), None);
    }
}
