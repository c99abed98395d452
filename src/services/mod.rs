pub mod academic_report;
pub mod alerts;
pub mod auth;
pub mod bootstrap_admin;
pub mod message;
pub mod notification;
pub mod session;
pub mod student;
