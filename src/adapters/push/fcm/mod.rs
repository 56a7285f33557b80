pub mod error_response;
pub mod payload;

use crate::adapters::push::credentials::AccessTokenProvider;
use crate::domain::notification::PublishError;
use error_response::classify_failure;
use payload::{CustomData, SendRequest};
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;

const FCM_CONTENT_TYPE: &str = "application/json; UTF-8";

/// Builds the HTTP v1 send endpoint for a Firebase project.
#[must_use]
pub fn send_endpoint(project_id: &str) -> String {
    format!("https://fcm.googleapis.com/v1/projects/{project_id}/messages:send")
}

/// Client for the FCM HTTP v1 `messages:send` endpoint.
#[derive(Clone, Debug)]
pub struct FcmClient {
    http: reqwest::Client,
    endpoint: String,
    credentials: Arc<dyn AccessTokenProvider>,
    custom_data: Arc<CustomData>,
}

impl FcmClient {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        endpoint: String,
        credentials: Arc<dyn AccessTokenProvider>,
        custom_data: CustomData,
    ) -> Self {
        Self { http, endpoint, credentials, custom_data: Arc::new(custom_data) }
    }

    /// Sends one notification to one registration token.
    ///
    /// # Errors
    /// Returns the classified failure when the gateway could not be reached or rejected the send.
    #[tracing::instrument(level = "debug", skip(self, title, body))]
    pub async fn send(&self, registration_id: &str, title: &str, body: &str) -> Result<(), PublishError> {
        let payload = SendRequest::new(registration_id, title, body, &self.custom_data);
        tracing::debug!(payload = ?payload, "Starting gateway request");

        let token = match self.credentials.access_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "Failed to obtain gateway access token");
                return Err(PublishError::NetworkError);
            }
        };

        let response = match self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .header(CONTENT_TYPE, FCM_CONTENT_TYPE)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Gateway request failed");
                return Err(PublishError::NetworkError);
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, status = status.as_u16(), "Failed to read gateway response");
                return Err(classify_failure(None));
            }
        };

        tracing::debug!(status = status.as_u16(), response = %text, "Gateway responded");

        if status.is_success() { Ok(()) } else { Err(classify_failure(Some(&text))) }
    }
}
