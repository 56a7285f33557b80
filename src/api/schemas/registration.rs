use crate::domain::registration::Platform;
use serde::{Deserialize, Serialize};

const MAX_TOKEN_LEN: usize = 4096;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    pub platform: String,
    pub user_id: String,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterDeviceResponse {
    pub message: String,
}

/// A registration request that passed validation. The token is trimmed.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidRegistration<'a> {
    pub platform: Platform,
    pub user_id: &'a str,
    pub token: &'a str,
}

impl RegisterDeviceRequest {
    /// Validates the registration payload and resolves its platform tag.
    ///
    /// # Errors
    /// Returns an error if the platform is unknown, the user id is blank, or the
    /// token is blank or excessively large.
    pub fn validate(&self) -> Result<ValidRegistration<'_>, String> {
        let platform = self.platform.parse::<Platform>().map_err(|_| "Missing valid platform type".to_string())?;
        if self.user_id.trim().is_empty() {
            return Err("User id cannot be empty".into());
        }
        let token = self.token.trim();
        if token.is_empty() {
            return Err("Token cannot be empty".into());
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(format!("Token is too long (max {MAX_TOKEN_LEN} bytes)"));
        }
        Ok(ValidRegistration { platform, user_id: &self.user_id, token })
    }
}
