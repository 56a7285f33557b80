//! Request bodies for the FCM HTTP v1 `messages:send` endpoint.
//!
//! One body serves both platforms: FCM forwards the `android` block to Android
//! devices and the `apns` block to iOS devices.

use serde::Serialize;
use std::collections::BTreeMap;

/// Custom key/value pairs attached to every notification.
pub type CustomData = BTreeMap<String, String>;

#[derive(Debug, Serialize)]
pub struct SendRequest<'a> {
    message: Message<'a>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    token: &'a str,
    notification: NotificationBlock<'a>,
    android: AndroidConfig<'a>,
    apns: ApnsConfig<'a>,
}

#[derive(Debug, Serialize)]
struct NotificationBlock<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct AndroidConfig<'a> {
    priority: &'static str,
    data: &'a CustomData,
}

#[derive(Debug, Serialize)]
struct ApnsConfig<'a> {
    payload: ApnsPayload<'a>,
}

#[derive(Debug, Serialize)]
struct ApnsPayload<'a> {
    aps: Aps,
    #[serde(flatten)]
    custom: &'a CustomData,
}

// Apple expects these flags as integers, not booleans.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct Aps {
    content_available: u8,
    mutable_content: u8,
}

impl<'a> SendRequest<'a> {
    #[must_use]
    pub const fn new(registration_id: &'a str, title: &'a str, body: &'a str, custom: &'a CustomData) -> Self {
        Self {
            message: Message {
                token: registration_id,
                notification: NotificationBlock { title, body },
                android: AndroidConfig { priority: "HIGH", data: custom },
                apns: ApnsConfig {
                    payload: ApnsPayload { aps: Aps { content_available: 1, mutable_content: 1 }, custom },
                },
            },
        }
    }
}
