pub mod attendance;
pub mod department;
pub mod employee;
pub mod holiday;
pub mod lunch;
pub mod message;
pub mod notification;
pub mod ping;
pub mod progress;
pub mod role;
pub mod task;
