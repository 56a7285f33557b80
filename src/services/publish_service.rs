use crate::adapters::memory::RegistrationRepository;
use crate::adapters::push::FcmClient;
use crate::domain::notification::{PublishError, PublishOutcome};
use crate::domain::registration::Registration;
use opentelemetry::{KeyValue, global, metrics::Counter};

#[derive(Clone, Debug)]
struct Metrics {
    sent: Counter<u64>,
    errors: Counter<u64>,
    invalidated_tokens: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("push-relay");
        Self {
            sent: meter
                .u64_counter("push_sent_total")
                .with_description("Total number of push notifications accepted by the gateway")
                .build(),
            errors: meter
                .u64_counter("push_errors_total")
                .with_description("Total number of push notification delivery errors")
                .build(),
            invalidated_tokens: meter
                .u64_counter("push_invalidated_tokens_total")
                .with_description("Total number of registrations removed because the gateway rejected the token")
                .build(),
        }
    }
}

/// Fans a notification out to every device a user has registered.
#[derive(Clone, Debug)]
pub struct PublishService {
    repo: RegistrationRepository,
    gateway: FcmClient,
    metrics: Metrics,
}

impl PublishService {
    #[must_use]
    pub fn new(repo: RegistrationRepository, gateway: FcmClient) -> Self {
        Self { repo, gateway, metrics: Metrics::new() }
    }

    /// Sends the notification to each of the user's registrations, one at a time.
    ///
    /// Every registration is attempted regardless of earlier failures. Once the batch
    /// is done, registrations the gateway reported as invalid are removed; any other
    /// failure is only logged and left for the caller to retry.
    ///
    /// Returns one outcome per attempted registration, in dispatch order.
    #[tracing::instrument(skip(self, title, body))]
    pub async fn publish(&self, user_id: &str, title: &str, body: &str) -> Vec<PublishOutcome> {
        let registrations = self.repo.list(user_id);
        if registrations.is_empty() {
            tracing::debug!("No registrations for user");
            return Vec::new();
        }

        tracing::info!(count = registrations.len(), "Publishing notification");

        let mut outcomes = Vec::with_capacity(registrations.len());
        for registration in registrations {
            outcomes.push(self.dispatch(registration, title, body).await);
        }

        self.reconcile(&outcomes);
        outcomes
    }

    async fn dispatch(&self, registration: Registration, title: &str, body: &str) -> PublishOutcome {
        let error = self.gateway.send(&registration.registration_id, title, body).await.err();
        if error.is_none() {
            self.metrics.sent.add(1, &[]);
        }
        PublishOutcome { registration, error }
    }

    fn reconcile(&self, outcomes: &[PublishOutcome]) {
        for PublishOutcome { registration, error } in outcomes {
            let Some(error) = *error else { continue };
            tracing::warn!(
                error = %error,
                platform = %registration.platform,
                registration_id = %registration.registration_id,
                "Failed to publish notification"
            );
            self.metrics.errors.add(1, &[KeyValue::new("reason", error.label())]);

            if error == PublishError::InvalidRegistrationIdError {
                tracing::info!(
                    registration_id = %registration.registration_id,
                    "Registration token was invalid, removing it"
                );
                self.repo.remove(registration);
                self.metrics.invalidated_tokens.add(1, &[]);
            }
        }
    }
}
