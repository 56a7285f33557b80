use crate::adapters::memory::RegistrationRepository;
use crate::domain::registration::{Platform, Registration};

#[derive(Clone, Debug)]
pub struct RegistrationService {
    repo: RegistrationRepository,
}

impl RegistrationService {
    #[must_use]
    pub const fn new(repo: RegistrationRepository) -> Self {
        Self { repo }
    }

    /// Records a device token for a user. Registering the same token twice is a no-op.
    #[tracing::instrument(skip(self, platform, registration_id), fields(platform = %platform))]
    pub fn register(&self, platform: Platform, user_id: &str, registration_id: &str) {
        self.repo.store(Registration::new(platform, user_id, registration_id));
        tracing::info!("Device registered");
    }
}
