//! Serialized description of an own Sone
//!
//! The CLI and tests load Sones from JSON documents of this shape:
//!
//! ```json
//! {
//!   "id": "nWnbLRfwLJjJZDxHH~Rt1tKsOo93vsWbCVWDwbBGDCM",
//!   "name": "alice",
//!   "request_uri": "USK@nWnb...,AQACAAE/Sone/0",
//!   "insert_uri": "SSK@Zk2v...,AQECAAE/",
//!   "posts": [{ "text": "Hello Freenet" }]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::model::post::now_millis;
use crate::model::{FreenetUri, Post, Profile, Reply, Sone};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoneDefinition {
    pub id: String,
    pub name: String,
    pub request_uri: FreenetUri,
    pub insert_uri: FreenetUri,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub posts: Vec<PostDefinition>,
    #[serde(default)]
    pub replies: Vec<ReplyDefinition>,
    #[serde(default)]
    pub friend_ids: Vec<String>,
    #[serde(default)]
    pub liked_post_ids: Vec<String>,
    #[serde(default)]
    pub liked_reply_ids: Vec<String>,
    #[serde(default)]
    pub blocked_sone_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDefinition {
    /// Generated when absent
    pub id: Option<String>,
    /// Defaults to load time
    pub time: Option<i64>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyDefinition {
    pub id: Option<String>,
    pub post_id: String,
    pub time: Option<i64>,
    pub text: String,
}

impl SoneDefinition {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a definition file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Build the Sone
    ///
    /// Loading is not an edit: the returned Sone has a zero modification
    /// counter.
    pub fn into_sone(self) -> Sone {
        let mut sone = Sone::new(self.id, self.name, self.request_uri, self.insert_uri);
        let sone_id = sone.id().to_string();
        let now = now_millis();

        sone.set_profile(self.profile);
        for post in self.posts {
            let mut built = Post::with_time(&sone_id, post.time.unwrap_or(now), post.text);
            if let Some(id) = post.id {
                built.id = id;
            }
            sone.add_post(built);
        }
        for reply in self.replies {
            let mut built = Reply::with_time(
                &sone_id,
                reply.post_id,
                reply.time.unwrap_or(now),
                reply.text,
            );
            if let Some(id) = reply.id {
                built.id = id;
            }
            sone.add_reply(built);
        }
        for id in self.friend_ids {
            sone.add_friend(id);
        }
        for id in self.liked_post_ids {
            sone.add_liked_post_id(id);
        }
        for id in self.liked_reply_ids {
            sone.add_liked_reply_id(id);
        }
        for id in self.blocked_sone_ids {
            sone.add_blocked_sone_id(id);
        }

        sone.set_modification_counter(0);
        sone
    }
}
