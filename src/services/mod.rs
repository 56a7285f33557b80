pub mod publish_service;
pub mod registration_service;
