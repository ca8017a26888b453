pub mod attendance;
pub mod auth;
pub mod departments;
pub mod employees;
pub mod health;
pub mod holiday_requests;
pub mod holidays;
pub mod lunch;
pub mod messages;
pub mod notifications;
pub mod pings;
pub mod progress;
pub mod roles;
pub mod tasks;

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
