use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authz::PermissionSet;
use crate::errors::AppError;

/// Role claim carried by admin assertions.
pub const ADMIN_ROLE_CLAIM: &str = "Admin";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Arc<Vec<u8>>,
    pub exp_hours: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<Vec<u8>>, exp_hours: i64) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            exp_hours,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        let exp_hours = std::env::var("JWT_EXP_HOURS")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(24))
            .map_err(|_| AppError::configuration("JWT_EXP_HOURS must be a valid integer"))?;

        Ok(Self::new(secret.into_bytes(), exp_hours))
    }

    /// Lifetime of issued tokens, also used as the cookie `Max-Age`.
    pub fn ttl_seconds(&self) -> i64 {
        self.exp_hours * 3600
    }

    pub fn encode_admin(&self, username: &str) -> Result<String, AppError> {
        let (iat, exp) = self.window();
        let claims = AdminClaims {
            role: ADMIN_ROLE_CLAIM.to_string(),
            username: username.to_string(),
            exp,
            iat,
        };
        self.sign(&claims)
    }

    pub fn encode_employee(
        &self,
        id: Uuid,
        email: &str,
        role: Option<&str>,
        permissions: PermissionSet,
    ) -> Result<String, AppError> {
        let (iat, exp) = self.window();
        let claims = EmployeeClaims {
            id,
            email: email.to_string(),
            role: role.map(str::to_string),
            permissions,
            exp,
            iat,
        };
        self.sign(&claims)
    }

    pub fn decode_admin(&self, token: &str) -> Option<AdminClaims> {
        self.verify(token)
    }

    pub fn decode_employee(&self, token: &str) -> Option<EmployeeClaims> {
        self.verify(token)
    }

    fn window(&self) -> (usize, usize) {
        let now = Utc::now();
        let exp = now + Duration::hours(self.exp_hours);
        (now.timestamp() as usize, exp.timestamp() as usize)
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String, AppError> {
        jsonwebtoken::encode(&Header::default(), claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::internal(format!("failed to sign token: {err}")))
    }

    // Verification failures collapse to `None`: a bad assertion is the same as no assertion.
    fn verify<C: DeserializeOwned>(&self, token: &str) -> Option<C> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        match jsonwebtoken::decode::<C>(token, &DecodingKey::from_secret(&self.secret), &validation) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                tracing::debug!(error = %err, "rejected signed assertion");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub role: String,
    pub username: String,
    pub exp: usize,
    pub iat: usize,
}

/// Claims issued at employee login. The embedded permissions are informational
/// for clients; the server always re-resolves them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeClaims {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub permissions: PermissionSet,
    pub exp: usize,
    pub iat: usize,
}
