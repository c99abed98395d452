pub mod hub;
pub mod notification;
