pub mod publish;
pub mod registration;
