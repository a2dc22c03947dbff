//! What an Octothorpe can be built from, merged with, or compared against.
//!
//! Anything that implements [`HashLike`] is accepted. Rust types that are not
//! mappings simply don't implement it; dynamic documents (JSON) are checked at
//! runtime and rejected with [`OctoError::InvalidSource`] when they hold a scalar.

use crate::any_value::{AnyValue, Value};
use crate::error::{OctoError, Result};
use crate::key::Key;
use crate::octothorpe::Octothorpe;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// A plain, insertion-ordered mapping from canonical key to value
pub type Hash = IndexMap<Key, AnyValue>;

/// A source of key/value pairs.
///
/// `into_hash` returns `Ok(None)` for an absent or null source. Construction
/// treats that as empty; merging and comparing treat it as an invalid source.
pub trait HashLike {
    fn into_hash(self) -> Result<Option<Hash>>;
}

/// Convert a source that must be present.
pub(crate) fn required<S: HashLike>(source: S) -> Result<Hash> {
    source
        .into_hash()?
        .ok_or_else(|| OctoError::InvalidSource("nothing (a null source)".to_string()))
}

fn normalize<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Hash
where
    K: Into<Key>,
    V: Value,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), AnyValue::new(value)))
        .collect()
}

fn normalize_ref<'a, K, V>(pairs: impl IntoIterator<Item = (&'a K, &'a V)>) -> Hash
where
    K: AsRef<str> + 'a,
    V: Value + Clone,
{
    pairs
        .into_iter()
        .map(|(key, value)| (Key::new(key), AnyValue::new(value.clone())))
        .collect()
}

impl HashLike for Octothorpe {
    fn into_hash(self) -> Result<Option<Hash>> {
        Ok(Some(self.into_store()))
    }
}

impl HashLike for &Octothorpe {
    fn into_hash(self) -> Result<Option<Hash>> {
        Ok(Some(self.store().clone()))
    }
}

impl<S: HashLike> HashLike for Option<S> {
    fn into_hash(self) -> Result<Option<Hash>> {
        match self {
            Some(source) => source.into_hash(),
            None => Ok(None),
        }
    }
}

impl<K: Into<Key>, V: Value, S> HashLike for HashMap<K, V, S> {
    fn into_hash(self) -> Result<Option<Hash>> {
        Ok(Some(normalize(self)))
    }
}

impl<K: AsRef<str>, V: Value + Clone, S> HashLike for &HashMap<K, V, S> {
    fn into_hash(self) -> Result<Option<Hash>> {
        Ok(Some(normalize_ref(self)))
    }
}

impl<K: Into<Key>, V: Value> HashLike for BTreeMap<K, V> {
    fn into_hash(self) -> Result<Option<Hash>> {
        Ok(Some(normalize(self)))
    }
}

impl<K: AsRef<str>, V: Value + Clone> HashLike for &BTreeMap<K, V> {
    fn into_hash(self) -> Result<Option<Hash>> {
        Ok(Some(normalize_ref(self)))
    }
}

impl<K: Into<Key>, V: Value, S> HashLike for IndexMap<K, V, S> {
    fn into_hash(self) -> Result<Option<Hash>> {
        Ok(Some(normalize(self)))
    }
}

impl<K: AsRef<str>, V: Value + Clone, S: BuildHasher> HashLike for &IndexMap<K, V, S> {
    fn into_hash(self) -> Result<Option<Hash>> {
        Ok(Some(normalize_ref(self)))
    }
}

impl<K: Into<Key>, V: Value> HashLike for Vec<(K, V)> {
    fn into_hash(self) -> Result<Option<Hash>> {
        Ok(Some(normalize(self)))
    }
}

impl<K: AsRef<str>, V: Value + Clone> HashLike for &[(K, V)] {
    fn into_hash(self) -> Result<Option<Hash>> {
        Ok(Some(normalize_ref(self.iter().map(|(k, v)| (k, v)))))
    }
}

impl<K: Into<Key>, V: Value, const N: usize> HashLike for [(K, V); N] {
    fn into_hash(self) -> Result<Option<Hash>> {
        Ok(Some(normalize(self)))
    }
}

#[cfg(feature = "json")]
mod json {
    use super::*;
    use serde_json::{Map, Value as Json};

    fn describe(value: &Json) -> &'static str {
        match value {
            Json::Null => "null",
            Json::Bool(_) => "a JSON boolean",
            Json::Number(_) => "a JSON number",
            Json::String(_) => "a JSON string",
            Json::Array(_) => "a JSON array",
            Json::Object(_) => "a JSON object",
        }
    }

    impl HashLike for Json {
        fn into_hash(self) -> Result<Option<Hash>> {
            match self {
                Json::Object(map) => map.into_hash(),
                Json::Null => Ok(None),
                other => Err(OctoError::InvalidSource(describe(&other).to_string())),
            }
        }
    }

    impl HashLike for &Json {
        fn into_hash(self) -> Result<Option<Hash>> {
            match self {
                Json::Object(map) => map.into_hash(),
                Json::Null => Ok(None),
                other => Err(OctoError::InvalidSource(describe(other).to_string())),
            }
        }
    }

    impl HashLike for Map<String, Json> {
        fn into_hash(self) -> Result<Option<Hash>> {
            Ok(Some(normalize(self)))
        }
    }

    impl HashLike for &Map<String, Json> {
        fn into_hash(self) -> Result<Option<Hash>> {
            Ok(Some(normalize_ref(self)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_spellings_collapse() -> Result<()> {
        let hash = required(vec![
            (Key::from("two"), 2),
            (Key::from("one"), 1),
            (Key::from("two".to_string()), 22),
        ])?;

        // first position, last value
        assert_eq!(hash.len(), 2);
        assert_eq!(hash.get_index(0).map(|(k, _)| k.as_str()), Some("two"));
        assert_eq!(hash.get("two"), Some(&AnyValue::new(22)));
        Ok(())
    }

    #[test]
    fn test_absent_source() -> Result<()> {
        assert_eq!(None::<Vec<(&str, i32)>>.into_hash()?, None);
        assert!(matches!(
            required(None::<Vec<(&str, i32)>>),
            Err(OctoError::InvalidSource(_))
        ));
        Ok(())
    }

    #[test]
    fn test_borrowed_sources_copy() -> Result<()> {
        let mut plain = HashMap::new();
        plain.insert("a", 1i32);

        let hash = required(&plain)?;
        assert_eq!(hash.get("a"), Some(&AnyValue::new(1i32)));
        assert_eq!(plain.len(), 1);

        let pairs = [("b", "x".to_string())];
        let hash = required(&pairs[..])?;
        assert_eq!(hash.get("b"), Some(&AnyValue::new("x".to_string())));
        Ok(())
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_scalars_are_rejected() {
        use serde_json::json;

        for scalar in [json!(14), json!("hello"), json!(true), json!([1, 2])] {
            assert!(matches!(
                scalar.into_hash(),
                Err(OctoError::InvalidSource(_))
            ));
        }
        assert_eq!(json!(null).into_hash(), Ok(None));
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_object_keeps_values_as_json() -> Result<()> {
        use serde_json::json;

        let hash = required(json!({"one": "a", "two": 2}))?;
        assert_eq!(hash.get("one"), Some(&AnyValue::new(json!("a"))));
        assert_eq!(hash.get("two"), Some(&AnyValue::new(json!(2))));
        Ok(())
    }
}
