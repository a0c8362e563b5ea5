//! Loading a [`ParserStates`] document from JSON.
//!
//! The main entry points are [`from_json`] and [`from_value`]. Maps keyed
//! by terminals or nonterminals are written as lists of `[key, value]`
//! pairs, since JSON object keys must be strings.

use crate::states::ParserStates;

/// Errors while loading an IR document.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    /// Malformed JSON, a missing field, or a type outside the type
    /// algebra. Carries serde_json's line/column information.
    #[error("invalid IR document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse an IR document from JSON text.
pub fn from_json(text: &str) -> Result<ParserStates, IrError> {
    Ok(serde_json::from_str(text)?)
}

/// Convert an already-parsed JSON value into an IR document.
pub fn from_value(value: serde_json::Value) -> Result<ParserStates, IrError> {
    Ok(serde_json::from_value(value)?)
}

/// `#[serde(with = "pairs")]` for `IndexMap`s with non-string keys.
pub(crate) mod pairs {
    use std::fmt;
    use std::hash::Hash;

    use indexmap::IndexMap;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<K, V, S>(map: &IndexMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.iter())
    }

    /// Rejects a key that appears twice rather than keeping the last pair.
    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<IndexMap<K, V>, D::Error>
    where
        K: Deserialize<'de> + Hash + Eq + fmt::Display,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let pairs = Vec::<(K, V)>::deserialize(deserializer)?;
        let mut map = IndexMap::with_capacity(pairs.len());
        for (key, value) in pairs {
            if map.contains_key(&key) {
                return Err(D::Error::custom(format!("duplicate key {}", key)));
            }
            map.insert(key, value);
        }
        Ok(map)
    }
}
