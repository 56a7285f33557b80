pub mod notification;
pub mod registration;
