use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// Tag used on the wire for this platform.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
        }
    }

    /// Human readable name, used in intake responses.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Ios => "iOS",
            Self::Android => "Android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized platform tag")]
pub struct UnknownPlatform;

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            _ => Err(UnknownPlatform),
        }
    }
}

/// One device endpoint belonging to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub platform: Platform,
    pub user_id: String,
    pub registration_id: String,
}

impl Registration {
    #[must_use]
    pub fn new(platform: Platform, user_id: impl Into<String>, registration_id: impl Into<String>) -> Self {
        Self { platform, user_id: user_id.into(), registration_id: registration_id.into() }
    }
}
