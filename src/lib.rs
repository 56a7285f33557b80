#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

use adapters::memory::RegistrationRepository;
use adapters::push::{AccessTokenProvider, FcmClient, ServiceAccountCredentials, StaticToken, fcm};
use api::AppState;
use config::{Config, FcmConfig};
use services::publish_service::PublishService;
use services::registration_service::RegistrationService;
use std::sync::Arc;
use tokio_util::task::TaskTracker;

/// Wires the registration store, gateway client and services together.
#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    http: Option<reqwest::Client>,
    credentials: Option<Arc<dyn AccessTokenProvider>>,
    repo: RegistrationRepository,
}

impl AppBuilder {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config, http: None, credentials: None, repo: RegistrationRepository::new() }
    }

    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Arc<dyn AccessTokenProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub fn with_repository(mut self, repo: RegistrationRepository) -> Self {
        self.repo = repo;
        self
    }

    /// Builds the application state.
    ///
    /// # Errors
    /// Returns an error if no credentials are configured or the gateway endpoint
    /// cannot be determined.
    pub fn build(self) -> anyhow::Result<AppState> {
        let http = self.http.unwrap_or_default();
        let fcm_config = &self.config.fcm;

        let (credentials, key_project_id) = match self.credentials {
            Some(credentials) => (credentials, None),
            None => load_credentials(fcm_config, &http)?,
        };

        let endpoint = match (&fcm_config.endpoint, &fcm_config.project_id, key_project_id) {
            (Some(endpoint), _, _) => endpoint.clone(),
            (None, Some(project_id), _) => fcm::send_endpoint(project_id),
            (None, None, Some(project_id)) => fcm::send_endpoint(&project_id),
            (None, None, None) => anyhow::bail!("No FCM project id configured and none found in the service account key"),
        };
        tracing::info!(endpoint = %endpoint, "Push gateway configured");

        let gateway = FcmClient::new(http, endpoint, credentials, fcm_config.custom_data());

        Ok(AppState {
            registration_service: RegistrationService::new(self.repo.clone()),
            publish_service: PublishService::new(self.repo, gateway),
            tasks: TaskTracker::new(),
        })
    }
}

fn load_credentials(
    config: &FcmConfig,
    http: &reqwest::Client,
) -> anyhow::Result<(Arc<dyn AccessTokenProvider>, Option<String>)> {
    if let Some(token) = &config.access_token {
        return Ok((Arc::new(StaticToken::new(token.clone())), None));
    }

    let key = adapters::push::credentials::ServiceAccountKey::from_file(&config.service_account_file)?;
    let project_id = key.project_id.clone();
    let credentials = ServiceAccountCredentials::new(key, http.clone())?;
    Ok((Arc::new(credentials), project_id))
}

/// Sets a panic hook that routes panics through tracing.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let payload = panic_info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        let location = panic_info.location().map(ToString::to_string).unwrap_or_default();

        tracing::error!(message = %message, location = %location, "Application panicked");
    }));
}

/// Resolves once SIGINT or SIGTERM is received.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
