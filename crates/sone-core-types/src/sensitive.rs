//! Sensitive data marker for automatic redaction
//!
//! Insert keys are the private half of a Sone's key pair. Anyone holding
//! one can publish as that Sone, so they travel wrapped in `Sensitive<T>`
//! and never show up in Debug or Display output.

use std::fmt;

/// Wrapper for sensitive data that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use sone_core_types::Sensitive;
///
/// let insert_key = Sensitive::new("SSK@private,key,AQECAAE/");
/// assert_eq!(format!("{:?}", insert_key), "***REDACTED***");
/// assert_eq!(format!("{}", insert_key), "***REDACTED***");
///
/// // Access the actual value when needed
/// assert_eq!(insert_key.expose(), &"SSK@private,key,AQECAAE/");
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying sensitive value
    ///
    /// Only the insert path should need this.
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: PartialEq> PartialEq for Sensitive<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_debug_redaction() {
        let key = Sensitive::new("SSK@secret-routing-key,crypto,AQECAAE/");
        let debug_str = format!("{:?}", key);
        assert_eq!(debug_str, "***REDACTED***");
        assert!(!debug_str.contains("secret-routing-key"));
    }

    #[test]
    fn test_sensitive_display_redaction() {
        let key = Sensitive::new("SSK@secret-routing-key,crypto,AQECAAE/");
        assert_eq!(format!("{}", key), "***REDACTED***");
    }

    #[test]
    fn test_sensitive_into_inner() {
        let key = Sensitive::new(String::from("SSK@k/"));
        assert_eq!(key.into_inner(), "SSK@k/");
    }

    #[test]
    fn test_sensitive_clone_and_eq() {
        let key1 = Sensitive::new(String::from("SSK@k/"));
        let key2 = key1.clone();
        assert_eq!(key1, key2);
        assert_eq!(key1.expose(), key2.expose());
    }

    #[test]
    fn test_sensitive_inside_struct_debug() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Keys {
            request: String,
            insert: Sensitive<String>,
        }

        let keys = Keys {
            request: "USK@public/Sone/0".to_string(),
            insert: Sensitive::new("USK@private/Sone/0".to_string()),
        };

        let debug_str = format!("{:?}", keys);
        assert!(debug_str.contains("USK@public"));
        assert!(debug_str.contains("***REDACTED***"));
        assert!(!debug_str.contains("USK@private"));
    }
}
