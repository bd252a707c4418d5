use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current time in milliseconds since the Unix epoch
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A short message a Sone publishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// UUID of the post
    pub id: String,
    /// ID of the Sone that wrote the post
    pub sone_id: String,
    /// Creation time in milliseconds since the Unix epoch
    pub time: i64,
    pub text: String,
}

impl Post {
    /// Create a new post with a random ID, timestamped now
    pub fn new(sone_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_time(sone_id, now_millis(), text)
    }

    /// Create a new post with a random ID and an explicit time
    pub fn with_time(sone_id: impl Into<String>, time: i64, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sone_id: sone_id.into(),
            time,
            text: text.into(),
        }
    }
}

/// A reply to a post, possibly one of another Sone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    /// ID of the post this reply refers to
    pub post_id: String,
    /// ID of the Sone that wrote the reply
    pub sone_id: String,
    pub time: i64,
    pub text: String,
}

impl Reply {
    pub fn new(
        sone_id: impl Into<String>,
        post_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::with_time(sone_id, post_id, now_millis(), text)
    }

    pub fn with_time(
        sone_id: impl Into<String>,
        post_id: impl Into<String>,
        time: i64,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.into(),
            sone_id: sone_id.into(),
            time,
            text: text.into(),
        }
    }
}
