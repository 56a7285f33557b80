use crate::domain::registration::Registration;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory registration store keyed by user id.
///
/// Each user maps to an insertion-ordered list of registrations with unique
/// registration ids. Cloning the repository yields another handle onto the same map.
#[derive(Clone, Debug, Default)]
pub struct RegistrationRepository {
    registrations: Arc<DashMap<String, Vec<Registration>>>,
}

impl RegistrationRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a registration unless the user already holds one with the same registration id.
    pub fn store(&self, registration: Registration) {
        let mut entry = self.registrations.entry(registration.user_id.clone()).or_default();
        if entry.iter().any(|existing| existing.registration_id == registration.registration_id) {
            tracing::debug!(
                user_id = %registration.user_id,
                registration_id = %registration.registration_id,
                "Registration already present"
            );
            return;
        }
        entry.push(registration);
    }

    /// Removes the registration matching this user and registration id, if present.
    pub fn remove(&self, registration: &Registration) {
        let user_id = &registration.user_id;
        if let Some(mut entry) = self.registrations.get_mut(user_id) {
            entry.retain(|existing| existing.registration_id != registration.registration_id);
        }
        self.registrations.remove_if(user_id, |_, remaining| remaining.is_empty());
    }

    /// Returns a copy of every registration held for the user.
    #[must_use]
    pub fn list(&self, user_id: &str) -> Vec<Registration> {
        self.registrations.get(user_id).map(|entry| entry.value().clone()).unwrap_or_default()
    }
}
