pub mod admin;
pub mod auth;
pub mod message;
pub mod notification;
pub mod report;
pub mod session;
pub mod student;

pub use auth::*;
