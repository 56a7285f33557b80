pub mod credentials;
pub mod fcm;

pub use credentials::{AccessTokenProvider, CredentialError, ServiceAccountCredentials, StaticToken};
pub use fcm::FcmClient;
