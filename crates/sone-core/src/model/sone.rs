//! The Sone identity and its shared, lock-guarded handle
//!
//! Web handlers and sync components mutate a `Sone` through its
//! `SoneHandle`; every effective change bumps the modification counter.
//! The inserter reads the counter and the keys under the same lock, and is
//! the only party that resets the counter to zero.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use serde::{Deserialize, Serialize};
use sone_core_types::Sensitive;

use crate::errors::{Result, SoneError};
use crate::model::post::now_millis;
use crate::model::{FreenetUri, Post, Profile, Reply};

/// A Sone owned by this node
#[derive(Debug, Clone)]
pub struct Sone {
    id: String,
    name: String,
    request_uri: FreenetUri,
    insert_uri: Sensitive<FreenetUri>,
    modification_counter: u64,
    /// Time of the last modification, milliseconds since the Unix epoch
    time: i64,
    profile: Profile,
    posts: Vec<Post>,
    replies: Vec<Reply>,
    friend_ids: BTreeSet<String>,
    liked_post_ids: BTreeSet<String>,
    liked_reply_ids: BTreeSet<String>,
    blocked_sone_ids: BTreeSet<String>,
}

impl Sone {
    /// Create an unmodified Sone with empty content
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        request_uri: FreenetUri,
        insert_uri: FreenetUri,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            request_uri,
            insert_uri: Sensitive::new(insert_uri),
            modification_counter: 0,
            time: now_millis(),
            profile: Profile::default(),
            posts: Vec::new(),
            replies: Vec::new(),
            friend_ids: BTreeSet::new(),
            liked_post_ids: BTreeSet::new(),
            liked_reply_ids: BTreeSet::new(),
            blocked_sone_ids: BTreeSet::new(),
        }
    }

    // ===== Accessors =====

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request_uri(&self) -> &FreenetUri {
        &self.request_uri
    }

    pub fn insert_uri(&self) -> &Sensitive<FreenetUri> {
        &self.insert_uri
    }

    /// Number of changes since the last successful, uncontested insert
    pub fn modification_counter(&self) -> u64 {
        self.modification_counter
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn replies(&self) -> &[Reply] {
        &self.replies
    }

    pub fn friend_ids(&self) -> &BTreeSet<String> {
        &self.friend_ids
    }

    pub fn is_friend(&self, sone_id: &str) -> bool {
        self.friend_ids.contains(sone_id)
    }

    pub fn is_liked_post_id(&self, post_id: &str) -> bool {
        self.liked_post_ids.contains(post_id)
    }

    pub fn is_liked_reply_id(&self, reply_id: &str) -> bool {
        self.liked_reply_ids.contains(reply_id)
    }

    pub fn is_blocked(&self, sone_id: &str) -> bool {
        self.blocked_sone_ids.contains(sone_id)
    }

    // ===== Mutators =====
    //
    // Each returns whether anything changed; only changes count.

    /// Add a post written by this Sone
    ///
    /// Posts of other Sones and duplicate IDs are ignored.
    pub fn add_post(&mut self, post: Post) -> bool {
        if post.sone_id != self.id || self.posts.iter().any(|p| p.id == post.id) {
            return false;
        }
        self.posts.push(post);
        self.modified()
    }

    pub fn remove_post(&mut self, post_id: &str) -> bool {
        let before = self.posts.len();
        self.posts.retain(|p| p.id != post_id);
        before != self.posts.len() && self.modified()
    }

    /// Add a reply written by this Sone
    pub fn add_reply(&mut self, reply: Reply) -> bool {
        if reply.sone_id != self.id || self.replies.iter().any(|r| r.id == reply.id) {
            return false;
        }
        self.replies.push(reply);
        self.modified()
    }

    pub fn remove_reply(&mut self, reply_id: &str) -> bool {
        let before = self.replies.len();
        self.replies.retain(|r| r.id != reply_id);
        before != self.replies.len() && self.modified()
    }

    /// Follow another Sone
    pub fn add_friend(&mut self, sone_id: impl Into<String>) -> bool {
        let sone_id = sone_id.into();
        sone_id != self.id && self.friend_ids.insert(sone_id) && self.modified()
    }

    pub fn remove_friend(&mut self, sone_id: &str) -> bool {
        self.friend_ids.remove(sone_id) && self.modified()
    }

    pub fn add_liked_post_id(&mut self, post_id: impl Into<String>) -> bool {
        self.liked_post_ids.insert(post_id.into()) && self.modified()
    }

    pub fn remove_liked_post_id(&mut self, post_id: &str) -> bool {
        self.liked_post_ids.remove(post_id) && self.modified()
    }

    pub fn add_liked_reply_id(&mut self, reply_id: impl Into<String>) -> bool {
        self.liked_reply_ids.insert(reply_id.into()) && self.modified()
    }

    pub fn remove_liked_reply_id(&mut self, reply_id: &str) -> bool {
        self.liked_reply_ids.remove(reply_id) && self.modified()
    }

    pub fn add_blocked_sone_id(&mut self, sone_id: impl Into<String>) -> bool {
        self.blocked_sone_ids.insert(sone_id.into()) && self.modified()
    }

    pub fn remove_blocked_sone_id(&mut self, sone_id: &str) -> bool {
        self.blocked_sone_ids.remove(sone_id) && self.modified()
    }

    pub fn set_profile(&mut self, profile: Profile) -> bool {
        if self.profile == profile {
            return false;
        }
        self.profile = profile;
        self.modified()
    }

    /// Force a republish without changing content
    pub fn mark_modified(&mut self) {
        self.modified();
    }

    /// Overwrite the modification counter
    ///
    /// Reserved for the inserter's reset after a successful insert.
    pub fn set_modification_counter(&mut self, modification_counter: u64) {
        self.modification_counter = modification_counter;
    }

    fn modified(&mut self) -> bool {
        self.modification_counter = self.modification_counter.saturating_add(1);
        self.time = now_millis();
        true
    }

    /// Public view of the current content
    ///
    /// Never includes the insert key or the block list.
    pub fn to_published(&self) -> PublishedSone {
        PublishedSone {
            id: self.id.clone(),
            name: self.name.clone(),
            request_uri: self.request_uri.clone(),
            time: self.time,
            profile: self.profile.clone(),
            posts: self.posts.clone(),
            replies: self.replies.clone(),
            friend_ids: self.friend_ids.iter().cloned().collect(),
            liked_post_ids: self.liked_post_ids.iter().cloned().collect(),
            liked_reply_ids: self.liked_reply_ids.iter().cloned().collect(),
        }
    }
}

/// What other nodes get to see of a Sone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedSone {
    pub id: String,
    pub name: String,
    pub request_uri: FreenetUri,
    pub time: i64,
    pub profile: Profile,
    pub posts: Vec<Post>,
    pub replies: Vec<Reply>,
    pub friend_ids: Vec<String>,
    pub liked_post_ids: Vec<String>,
    pub liked_reply_ids: Vec<String>,
}

/// Shared handle to a Sone guarded by a single exclusive lock
///
/// The ID and name never change after creation and are cached outside the
/// lock.
#[derive(Debug, Clone)]
pub struct SoneHandle {
    id: Arc<str>,
    name: Arc<str>,
    inner: Arc<Mutex<Sone>>,
}

impl SoneHandle {
    pub fn new(sone: Sone) -> Self {
        Self {
            id: Arc::from(sone.id()),
            name: Arc::from(sone.name()),
            inner: Arc::new(Mutex::new(sone)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Acquire the Sone's lock
    ///
    /// # Errors
    ///
    /// Returns `LockPoisoned` if a thread panicked while holding it.
    pub fn lock(&self) -> Result<MutexGuard<'_, Sone>> {
        self.inner.lock().map_err(|_| SoneError::LockPoisoned {
            what: format!("sone {}", self.id),
        })
    }

    /// Acquire the lock only if nobody holds it right now
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Sone>> {
        match self.inner.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::WouldBlock) | Err(TryLockError::Poisoned(_)) => None,
        }
    }

    /// Run `f` with exclusive access to the Sone
    pub fn modify<R>(&self, f: impl FnOnce(&mut Sone) -> R) -> Result<R> {
        let mut sone = self.lock()?;
        Ok(f(&mut sone))
    }

    pub fn modification_counter(&self) -> Result<u64> {
        Ok(self.lock()?.modification_counter())
    }
}
