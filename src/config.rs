//! Environment-driven configuration.
//!
//! Every value is read once at startup; tests build an [`AppConfig`] directly and
//! hand it to [`crate::app::create_app_with_config`].

use crate::errors::AppError;
use crate::jwt::JwtConfig;

/// The hard-coded admin credential pair. Never stored alongside employees.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        let username = std::env::var("ADMIN_USERNAME")
            .map_err(|_| AppError::configuration("ADMIN_USERNAME not set"))?;
        let password = std::env::var("ADMIN_PASSWORD")
            .map_err(|_| AppError::configuration("ADMIN_PASSWORD not set"))?;

        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::configuration("admin credentials must not be empty"));
        }

        Ok(Self { username, password })
    }

    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

/// How callers may declare an employee identity.
#[derive(Debug, Clone, Copy)]
pub struct IdentityPolicy {
    /// Accept the bare `x-user-id` header without proof of possession.
    pub trust_user_id_header: bool,
    /// Add `Secure` to issued cookies.
    pub secure_cookies: bool,
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self {
            trust_user_id_header: true,
            secure_cookies: false,
        }
    }
}

impl IdentityPolicy {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            trust_user_id_header: env_flag("TRUST_USER_ID_HEADER", defaults.trust_user_id_header)?,
            secure_cookies: env_flag("SECURE_COOKIES", defaults.secure_cookies)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub admin: AdminCredentials,
    pub identity: IdentityPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            jwt: JwtConfig::from_env()?,
            admin: AdminCredentials::from_env()?,
            identity: IdentityPolicy::from_env()?,
        })
    }
}

fn env_flag(name: &str, default: bool) -> Result<bool, AppError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            "" => Ok(default),
            _ => Err(AppError::configuration(format!("{name} must be a boolean"))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_credentials_require_exact_match() {
        let admin = AdminCredentials::new("boss", "hunter22");
        assert!(admin.matches("boss", "hunter22"));
        assert!(!admin.matches("Boss", "hunter22"));
        assert!(!admin.matches("boss", "hunter2"));
    }

    #[test]
    fn identity_policy_defaults_keep_header_path_open() {
        let policy = IdentityPolicy::default();
        assert!(policy.trust_user_id_header);
        assert!(!policy.secure_cookies);
    }
}
