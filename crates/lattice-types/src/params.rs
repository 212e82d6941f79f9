//! Named numeric parameters.
//!
//! Parameters are stored under lower-cased keys, so `probCatch`,
//! `probcatch` and `PROBCATCH` name the same value. Reading a parameter that
//! was never set is a hard [`ParamError::Unset`]: a rule asking for a value
//! the configuration never provided signals an engine/config mismatch and
//! must not be defaulted silently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Errors raised by parameter lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// The parameter was asked for but never set.
    #[error("parameter ({name}) asked for but not set")]
    Unset {
        /// The requested parameter name, as given by the caller.
        name: String,
    },
}

/// A case-insensitive map from parameter name to `f64` value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct ParamMap {
    values: BTreeMap<String, f64>,
}

impl ParamMap {
    /// Create an empty parameter map.
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Look up a parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::Unset`] if the parameter was never set.
    pub fn get(&self, name: &str) -> Result<f64, ParamError> {
        self.values
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| ParamError::Unset {
                name: name.to_owned(),
            })
    }

    /// Look up a parameter, returning `None` when it is unset.
    pub fn get_opt(&self, name: &str) -> Option<f64> {
        self.values.get(&name.to_lowercase()).copied()
    }

    /// Set a parameter, replacing any previous value.
    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_lowercase(), value);
    }

    /// Set a parameter only if it is not already present.
    pub fn set_default(&mut self, name: &str, value: f64) {
        self.values.entry(name.to_lowercase()).or_insert(value);
    }

    /// Whether the parameter has been set.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(&name.to_lowercase())
    }

    /// Iterate over `(lower-cased name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of parameters set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Exchange the full contents of two maps.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.values, &mut other.values);
    }
}

impl From<BTreeMap<String, f64>> for ParamMap {
    fn from(map: BTreeMap<String, f64>) -> Self {
        map.into_iter().collect()
    }
}

impl From<ParamMap> for BTreeMap<String, f64> {
    fn from(map: ParamMap) -> Self {
        map.values
    }
}

impl<K: AsRef<str>> FromIterator<(K, f64)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.set(name.as_ref(), value);
        }
        map
    }
}
