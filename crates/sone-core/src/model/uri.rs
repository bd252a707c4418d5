//! Freenet key URIs
//!
//! A URI has the shape `TYPE@key[/doc_name[/edition]][/meta...]`. Only USKs
//! carry an edition; the Sone inserter re-types its insert key to USK so
//! that every publish lands on the next edition of the same document.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SoneError};

/// Kind of Freenet key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// Content hash key
    Chk,
    /// Signed subspace key
    Ssk,
    /// Updatable subspace key (SSK plus edition)
    Usk,
    /// Keyword signed key
    Ksk,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Chk => "CHK",
            KeyType::Ssk => "SSK",
            KeyType::Usk => "USK",
            KeyType::Ksk => "KSK",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "CHK" => Some(KeyType::Chk),
            "SSK" => Some(KeyType::Ssk),
            "USK" => Some(KeyType::Usk),
            "KSK" => Some(KeyType::Ksk),
            _ => None,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed Freenet URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FreenetUri {
    key_type: KeyType,
    key: String,
    doc_name: Option<String>,
    edition: Option<i64>,
    meta_strings: Vec<String>,
}

impl FreenetUri {
    /// Parse a URI, accepting an optional `freenet:` prefix
    ///
    /// # Errors
    ///
    /// Returns `SoneError::InvalidUri` if the key type is unknown, the key
    /// part is empty, or a USK lacks a document name or numeric edition.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| SoneError::InvalidUri {
            uri: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        let trimmed = match trimmed.get(..8) {
            Some(prefix) if prefix.eq_ignore_ascii_case("freenet:") => &trimmed[8..],
            _ => trimmed,
        };

        let (type_part, rest) = trimmed
            .split_once('@')
            .ok_or_else(|| invalid("missing '@'"))?;
        let key_type = KeyType::parse(type_part).ok_or_else(|| invalid("unknown key type"))?;

        let mut parts = rest.split('/');
        let key = parts.next().unwrap_or_default().to_string();
        if key.is_empty() {
            return Err(invalid("empty key"));
        }

        let mut doc_name = None;
        let mut edition = None;
        if key_type == KeyType::Usk {
            let doc = parts
                .next()
                .filter(|d| !d.is_empty())
                .ok_or_else(|| invalid("USK without document name"))?;
            let raw_edition = parts
                .next()
                .ok_or_else(|| invalid("USK without edition"))?;
            doc_name = Some(doc.to_string());
            edition = Some(
                raw_edition
                    .parse::<i64>()
                    .map_err(|_| invalid("USK edition is not a number"))?,
            );
        } else if let Some(doc) = parts.next().filter(|d| !d.is_empty()) {
            doc_name = Some(doc.to_string());
        }

        let meta_strings = parts
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            key_type,
            key,
            doc_name,
            edition,
            meta_strings,
        })
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// The routing/crypto part between `@` and the first `/`
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn doc_name(&self) -> Option<&str> {
        self.doc_name.as_deref()
    }

    pub fn edition(&self) -> Option<i64> {
        self.edition
    }

    pub fn meta_strings(&self) -> &[String] {
        &self.meta_strings
    }

    /// Copy of this URI with another key type
    pub fn with_key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = key_type;
        self
    }

    /// Copy of this URI with another document name
    pub fn with_doc_name(mut self, doc_name: impl Into<String>) -> Self {
        self.doc_name = Some(doc_name.into());
        self
    }

    /// Copy of this URI with a suggested edition
    ///
    /// The network may publish at a later edition if this one is taken.
    pub fn with_suggested_edition(mut self, edition: i64) -> Self {
        self.edition = Some(edition);
        self
    }
}

impl fmt::Display for FreenetUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.key_type, self.key)?;
        match self.key_type {
            KeyType::Usk => {
                write!(
                    f,
                    "/{}/{}",
                    self.doc_name.as_deref().unwrap_or_default(),
                    self.edition.unwrap_or(0)
                )?;
            }
            _ => match &self.doc_name {
                Some(doc) => write!(f, "/{}", doc)?,
                None if self.key_type == KeyType::Ssk => f.write_str("/")?,
                None => {}
            },
        }
        for meta in &self.meta_strings {
            write!(f, "/{}", meta)?;
        }
        Ok(())
    }
}

impl FromStr for FreenetUri {
    type Err = SoneError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FreenetUri {
    type Error = SoneError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<FreenetUri> for String {
    fn from(uri: FreenetUri) -> Self {
        uri.to_string()
    }
}
