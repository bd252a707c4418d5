//! Runtime options registry
//!
//! Options have a default and an optional explicit value. Watchers are told
//! whenever the effective value of an option changes.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, RwLock};

use crate::config::SoneConfig;
use crate::errors::{Result, SoneError};

/// Name of the option holding the inserter poll interval in seconds
pub const INSERTION_DELAY: &str = "InsertionDelay";

/// Notified when an option's effective value changes
pub trait OptionWatcher<T>: Send + Sync {
    fn option_changed(&self, name: &str, old_value: &T, new_value: &T);
}

/// An option with a default and an optional explicit value
pub struct DefaultOption<T> {
    name: String,
    default_value: T,
    value: RwLock<Option<T>>,
    watchers: Mutex<Vec<Arc<dyn OptionWatcher<T>>>>,
}

impl<T> DefaultOption<T>
where
    T: Clone + PartialEq + Debug + Send + Sync,
{
    pub fn new(name: impl Into<String>, default_value: T) -> Self {
        Self {
            name: name.into(),
            default_value,
            value: RwLock::new(None),
            watchers: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    /// Current value, or the default if none is set
    pub fn get(&self) -> T {
        self.get_real().unwrap_or_else(|| self.default_value.clone())
    }

    /// The explicitly set value, `None` if unset
    pub fn get_real(&self) -> Option<T> {
        self.value.read().ok().and_then(|v| v.clone())
    }

    /// Set a new value, `None` resets to the default
    ///
    /// Watchers run on the calling thread after the value is stored.
    pub fn set(&self, value: Option<T>) -> Result<()> {
        let old_value = {
            let mut slot = self.value.write().map_err(|_| SoneError::LockPoisoned {
                what: format!("option {}", self.name),
            })?;
            let old = slot.clone().unwrap_or_else(|| self.default_value.clone());
            *slot = value;
            old
        };

        let new_value = self.get();
        if new_value != old_value {
            tracing::debug!(
                option = %self.name,
                old = ?old_value,
                new = ?new_value,
                "option changed"
            );
            for watcher in self.watchers()? {
                watcher.option_changed(&self.name, &old_value, &new_value);
            }
        }
        Ok(())
    }

    pub fn add_watcher(&self, watcher: Arc<dyn OptionWatcher<T>>) -> Result<()> {
        self.watchers
            .lock()
            .map_err(|_| SoneError::LockPoisoned {
                what: format!("watchers of option {}", self.name),
            })?
            .push(watcher);
        Ok(())
    }

    fn watchers(&self) -> Result<Vec<Arc<dyn OptionWatcher<T>>>> {
        Ok(self
            .watchers
            .lock()
            .map_err(|_| SoneError::LockPoisoned {
                what: format!("watchers of option {}", self.name),
            })?
            .clone())
    }
}

/// All named options of the plugin
#[derive(Default)]
pub struct Options {
    boolean_options: Mutex<HashMap<String, Arc<DefaultOption<bool>>>>,
    integer_options: Mutex<HashMap<String, Arc<DefaultOption<u64>>>>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options seeded from configuration
    ///
    /// Registers `InsertionDelay` with the configured interval as default.
    pub fn from_config(config: &SoneConfig) -> Result<Self> {
        let options = Self::new();
        options.add_integer_option(Arc::new(DefaultOption::new(
            INSERTION_DELAY,
            config.inserter.insertion_delay_secs,
        )))?;
        Ok(options)
    }

    pub fn add_boolean_option(
        &self,
        option: Arc<DefaultOption<bool>>,
    ) -> Result<Arc<DefaultOption<bool>>> {
        self.boolean_options
            .lock()
            .map_err(|_| poisoned("boolean options"))?
            .insert(option.name().to_string(), option.clone());
        Ok(option)
    }

    pub fn boolean_option(&self, name: &str) -> Result<Arc<DefaultOption<bool>>> {
        self.boolean_options
            .lock()
            .map_err(|_| poisoned("boolean options"))?
            .get(name)
            .cloned()
            .ok_or_else(|| SoneError::UnknownOption {
                name: name.to_string(),
            })
    }

    pub fn add_integer_option(
        &self,
        option: Arc<DefaultOption<u64>>,
    ) -> Result<Arc<DefaultOption<u64>>> {
        self.integer_options
            .lock()
            .map_err(|_| poisoned("integer options"))?
            .insert(option.name().to_string(), option.clone());
        Ok(option)
    }

    pub fn integer_option(&self, name: &str) -> Result<Arc<DefaultOption<u64>>> {
        self.integer_options
            .lock()
            .map_err(|_| poisoned("integer options"))?
            .get(name)
            .cloned()
            .ok_or_else(|| SoneError::UnknownOption {
                name: name.to_string(),
            })
    }
}

fn poisoned(what: &str) -> SoneError {
    SoneError::LockPoisoned {
        what: what.to_string(),
    }
}
