//! Classification of FCM error responses.
//!
//! A rejected send comes back with a Google RPC error envelope:
//!
//! ```json
//! {
//!   "error": {
//!     "code": 400,
//!     "message": "Request contains an invalid argument.",
//!     "status": "INVALID_ARGUMENT",
//!     "details": [
//!       { "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError", "errorCode": "INVALID_ARGUMENT" },
//!       {
//!         "@type": "type.googleapis.com/google.rpc.BadRequest",
//!         "fieldViolations": [{ "field": "message.token", "description": "Invalid registration token" }]
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! Everything below `error.details` is parsed leniently: a nested value of the
//! wrong shape is treated as absent.

use crate::domain::notification::PublishError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

const MESSAGE_TOKEN_FIELD: &str = "message.token";

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub details: Option<Vec<ErrorDetail>>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "@type", default, deserialize_with = "lenient")]
    pub type_url: Option<String>,
    #[serde(rename = "fieldViolations", default, deserialize_with = "lenient_list")]
    pub field_violations: Option<Vec<FieldViolation>>,
}

#[derive(Debug, Deserialize)]
pub struct FieldViolation {
    #[serde(default, deserialize_with = "lenient")]
    pub field: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
}

/// Deserializes a value, treating a wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Deserializes an array, dropping elements of the wrong shape. A non-array is absent.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(None);
    };
    Ok(Some(items.into_iter().filter_map(|item| serde_json::from_value(item).ok()).collect()))
}

impl ErrorResponse {
    /// Parses an error envelope, returning `None` when the body is not one.
    #[must_use]
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// Whether the gateway rejected the registration token itself.
    ///
    /// Looks at the first detail that carries field violations, then at the first
    /// violation in it that names a field.
    #[must_use]
    pub fn is_invalid_registration_token(&self) -> bool {
        self.error
            .as_ref()
            .and_then(|error| error.details.as_deref())
            .and_then(|details| details.iter().find_map(|detail| detail.field_violations.as_deref()))
            .and_then(|violations| violations.iter().find_map(|violation| violation.field.as_deref()))
            .is_some_and(|field| field == MESSAGE_TOKEN_FIELD)
    }

    #[must_use]
    pub fn classify(&self) -> PublishError {
        if self.is_invalid_registration_token() {
            PublishError::InvalidRegistrationIdError
        } else {
            PublishError::UnknownError
        }
    }
}

/// Classifies a failed send from its response body, if one could be read.
#[must_use]
pub fn classify_failure(body: Option<&str>) -> PublishError {
    let Some(body) = body else {
        return PublishError::NetworkError;
    };
    ErrorResponse::parse(body).map_or(PublishError::ResponseParsingError, |response| response.classify())
}
