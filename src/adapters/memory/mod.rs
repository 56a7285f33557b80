pub mod registration_repo;

pub use registration_repo::RegistrationRepository;
