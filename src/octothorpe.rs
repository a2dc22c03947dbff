use crate::any_value::{AnyValue, Value};
use crate::error::{OctoError, Result};
use crate::key::Key;
use crate::members::Members;
use crate::source::{self, Hash, HashLike};
use indexmap::map::{Entry, Iter, Keys, Values};
use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::ops::Index;
use tracing::{debug, trace};

/// A read-only hash whose keys are normalized, for passing messages between components.
///
/// Text keys and [`Key`]s with the same spelling are the same key. Once built, an
/// Octothorpe only changes through [`guard`](Octothorpe::guard) and
/// [`guard_with`](Octothorpe::guard_with), which fill keys that are missing, and
/// only until [`freeze`](Octothorpe::freeze) is called. Everything else either
/// reads or returns a new Octothorpe.
///
/// # Examples
///
/// ```
/// use octothorpe::{Key, Octothorpe};
///
/// let ot: Octothorpe = [("one", 1), ("two", 2)].into_iter().collect();
///
/// assert_eq!(ot.get_as::<i32>("two"), Some(&2));
/// assert_eq!(ot.get(Key::from("two")), ot.get("two"));
/// assert!(ot.get("three").is_none());
/// assert!(ot["three"].is_nil());
/// ```
#[derive(Clone, Default)]
pub struct Octothorpe {
    store: Hash,
    frozen: bool,
}

impl Octothorpe {
    /// Creates a new, empty Octothorpe
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an Octothorpe from anything hash-like.
    ///
    /// An absent source (`None`, JSON `null`) gives an empty Octothorpe. Another
    /// Octothorpe is taken as it is, since its keys are already canonical.
    ///
    /// # Errors
    ///
    /// Returns `OctoError::InvalidSource` if the source holds something that is
    /// not a mapping, such as a JSON number or string.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[cfg(feature = "json")]
    /// # fn main() -> Result<(), octothorpe::OctoError> {
    /// use octothorpe::{OctoError, Octothorpe};
    /// use serde_json::json;
    ///
    /// let ot = Octothorpe::try_new(json!({"one": 1, "weird key": 3}))?;
    /// assert_eq!(ot.get("weird key"), Some(&octothorpe::AnyValue::new(json!(3))));
    ///
    /// assert!(Octothorpe::try_new(json!(null))?.is_empty());
    /// assert!(matches!(Octothorpe::try_new(json!(14)), Err(OctoError::InvalidSource(_))));
    /// # Ok(())
    /// # }
    /// # #[cfg(not(feature = "json"))]
    /// # fn main() {}
    /// ```
    pub fn try_new<S: HashLike>(source: S) -> Result<Self> {
        let store = source.into_hash()?.unwrap_or_default();
        trace!(entries = store.len(), "built octothorpe");
        Ok(Self::from_store(store))
    }

    pub(crate) fn from_store(store: Hash) -> Self {
        Self {
            store,
            frozen: false,
        }
    }

    pub(crate) fn store(&self) -> &Hash {
        &self.store
    }

    pub(crate) fn into_store(self) -> Hash {
        self.store
    }

    /// A view for reading members by name, see [`Members`]
    pub fn members(&self) -> Members<'_> {
        Members::new(&self.store)
    }

    /// Returns the value for a key, or `None` if there isn't one
    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&AnyValue> {
        self.store.get(key.as_ref())
    }

    /// Returns the value for a key if it is present and of type T
    pub fn get_as<T: 'static>(&self, key: impl AsRef<str>) -> Option<&T> {
        self.get(key)?.downcast_ref::<T>()
    }

    /// Returns a copy of the contents as a plain hash.
    ///
    /// The copy is shallow: values are shared, not cloned. Changing the copy
    /// never changes the Octothorpe.
    pub fn to_h(&self) -> Hash {
        self.store.clone()
    }

    /// Makes the Octothorpe truly read-only; any later guard fails
    pub fn freeze(&mut self) -> &mut Self {
        self.frozen = true;
        self
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Sets each missing key to `T::default()`. Keys that are present are left alone.
    ///
    /// # Errors
    ///
    /// Returns `OctoError::Frozen` if the Octothorpe has been frozen. Nothing is
    /// changed in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use octothorpe::{OctoError, Octothorpe};
    ///
    /// let mut ot: Octothorpe = [("one", 1)].into_iter().collect();
    /// ot.guard::<Vec<String>>(["one", "three"])?;
    ///
    /// assert_eq!(ot.get_as::<i32>("one"), Some(&1));
    /// assert_eq!(ot.get_as::<Vec<String>>("three"), Some(&vec![]));
    ///
    /// ot.freeze();
    /// assert_eq!(ot.guard::<Vec<String>>(["four"]).err(), Some(OctoError::Frozen));
    /// # Ok::<(), OctoError>(())
    /// ```
    pub fn guard<T: Default + Value>(
        &mut self,
        keys: impl IntoIterator<Item = impl Into<Key>>,
    ) -> Result<&mut Self> {
        self.guard_with(keys, |_| T::default())
    }

    /// Sets each missing key to whatever `fill` returns for it.
    ///
    /// `fill` is only called for keys that are missing, once per key.
    ///
    /// # Errors
    ///
    /// Returns `OctoError::Frozen` if the Octothorpe has been frozen, before any
    /// key is looked at.
    pub fn guard_with<F, V>(
        &mut self,
        keys: impl IntoIterator<Item = impl Into<Key>>,
        mut fill: F,
    ) -> Result<&mut Self>
    where
        F: FnMut(&Key) -> V,
        V: Value,
    {
        if self.frozen {
            debug!("guard on a frozen octothorpe");
            return Err(OctoError::Frozen);
        }

        for key in keys {
            if let Entry::Vacant(slot) = self.store.entry(key.into()) {
                let value = AnyValue::new(fill(slot.key()));
                trace!(key = %slot.key(), "guard filled key");
                slot.insert(value);
            }
        }
        Ok(self)
    }

    /// Returns a new Octothorpe with the other's pairs added; the other's values win.
    ///
    /// # Errors
    ///
    /// Returns `OctoError::InvalidSource` if `other` is absent or not a mapping.
    pub fn merge<S: HashLike>(&self, other: S) -> Result<Octothorpe> {
        self.merge_with(other, |_, _, incoming| incoming.clone())
    }

    /// Returns a new Octothorpe with the other's pairs added.
    ///
    /// For a key present on both sides, `resolve(key, ours, theirs)` decides
    /// the value. Keys on one side only are copied across unchanged.
    ///
    /// # Errors
    ///
    /// Returns `OctoError::InvalidSource` if `other` is absent or not a mapping.
    ///
    /// # Examples
    ///
    /// ```
    /// use octothorpe::{OctoError, Octothorpe};
    ///
    /// let ot: Octothorpe = [("one", 1), ("two", 2)].into_iter().collect();
    /// let merged = ot.merge_with([("one", 3), ("two", 4)], |_, old, new| {
    ///     format!("{:?}.{:?}", old, new)
    /// })?;
    ///
    /// assert_eq!(merged.get_as::<String>("one").map(String::as_str), Some("1.3"));
    /// assert_eq!(merged.get_as::<String>("two").map(String::as_str), Some("2.4"));
    /// # Ok::<(), OctoError>(())
    /// ```
    pub fn merge_with<S, F, V>(&self, other: S, mut resolve: F) -> Result<Octothorpe>
    where
        S: HashLike,
        F: FnMut(&Key, &AnyValue, &AnyValue) -> V,
        V: Value,
    {
        let incoming = source::required(other)?;
        let mut merged = self.store.clone();
        let mut conflicts = 0usize;

        for (key, theirs) in incoming {
            match merged.entry(key) {
                Entry::Occupied(mut slot) => {
                    let value = AnyValue::new(resolve(slot.key(), slot.get(), &theirs));
                    slot.insert(value);
                    conflicts += 1;
                }
                Entry::Vacant(slot) => {
                    slot.insert(theirs);
                }
            }
        }

        trace!(entries = merged.len(), conflicts, "merged octothorpe");
        Ok(Self::from_store(merged))
    }

    /// Returns a new Octothorpe holding only the given keys.
    ///
    /// Keys that are not present are skipped. Order follows this Octothorpe.
    pub fn whitelist(&self, keys: impl IntoIterator<Item = impl AsRef<str>>) -> Octothorpe {
        let keys: Vec<_> = keys.into_iter().collect();
        let wanted: HashSet<&str> = keys.iter().map(|key| key.as_ref()).collect();

        self.store
            .iter()
            .filter(|(key, _)| wanted.contains(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// True if the other side holds exactly the same pairs.
    ///
    /// Unlike the containment checks this never fails: an absent or non-mapping
    /// operand is simply not equal.
    pub fn equals<S: HashLike>(&self, other: S) -> bool {
        match source::required(other) {
            Ok(other) => self.store == other,
            Err(_) => false,
        }
    }

    /// True if every pair here is also in `other` (`self <= other`).
    ///
    /// # Errors
    ///
    /// Returns `OctoError::InvalidSource` if `other` is absent or not a mapping.
    pub fn is_subset_of<S: HashLike>(&self, other: S) -> Result<bool> {
        let other = source::required(other)?;
        Ok(contains(&other, &self.store))
    }

    /// True if every pair here is in `other` and `other` has more (`self < other`).
    ///
    /// # Errors
    ///
    /// Returns `OctoError::InvalidSource` if `other` is absent or not a mapping.
    pub fn is_strict_subset_of<S: HashLike>(&self, other: S) -> Result<bool> {
        let other = source::required(other)?;
        Ok(self.store.len() < other.len() && contains(&other, &self.store))
    }

    /// True if every pair of `other` is also here (`self >= other`).
    ///
    /// # Errors
    ///
    /// Returns `OctoError::InvalidSource` if `other` is absent or not a mapping.
    pub fn is_superset_of<S: HashLike>(&self, other: S) -> Result<bool> {
        let other = source::required(other)?;
        Ok(contains(&self.store, &other))
    }

    /// True if every pair of `other` is here and this has more (`self > other`).
    ///
    /// # Errors
    ///
    /// Returns `OctoError::InvalidSource` if `other` is absent or not a mapping.
    pub fn is_strict_superset_of<S: HashLike>(&self, other: S) -> Result<bool> {
        let other = source::required(other)?;
        Ok(self.store.len() > other.len() && contains(&self.store, &other))
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.store.contains_key(key.as_ref())
    }

    /// Same as `contains_key`
    pub fn includes(&self, key: impl AsRef<str>) -> bool {
        self.contains_key(key)
    }

    /// True if any value equals `value`. An `AnyValue` is compared as itself.
    pub fn contains_value<T: Value>(&self, value: &T) -> bool {
        let any: &dyn Any = value;
        match any.downcast_ref::<AnyValue>() {
            Some(wanted) => self.store.values().any(|v| v == wanted),
            None => self.store.values().any(|v| v.downcast_ref::<T>() == Some(value)),
        }
    }

    /// Pairs in insertion order
    pub fn iter(&self) -> Iter<'_, Key, AnyValue> {
        self.store.iter()
    }

    pub fn keys(&self) -> Keys<'_, Key, AnyValue> {
        self.store.keys()
    }

    pub fn values(&self) -> Values<'_, Key, AnyValue> {
        self.store.values()
    }

    /// The pairs for which `predicate` holds, as a plain hash
    pub fn select<F>(&self, mut predicate: F) -> Hash
    where
        F: FnMut(&Key, &AnyValue) -> bool,
    {
        self.store
            .iter()
            .filter(|(key, value)| predicate(key, value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// The pairs for which `predicate` does not hold, as a plain hash
    pub fn reject<F>(&self, mut predicate: F) -> Hash
    where
        F: FnMut(&Key, &AnyValue) -> bool,
    {
        self.select(|key, value| !predicate(key, value))
    }

    pub fn map<F, R>(&self, f: F) -> Vec<R>
    where
        F: FnMut((&Key, &AnyValue)) -> R,
    {
        self.store.iter().map(f).collect()
    }

    /// Left fold over the pairs
    pub fn inject<F, R>(&self, init: R, mut f: F) -> R
    where
        F: FnMut(R, &Key, &AnyValue) -> R,
    {
        self.store
            .iter()
            .fold(init, |acc, (key, value)| f(acc, key, value))
    }
}

// True if every pair of `inner` is in `outer`.
fn contains(outer: &Hash, inner: &Hash) -> bool {
    inner.len() <= outer.len()
        && inner
            .iter()
            .all(|(key, value)| outer.get(key) == Some(value))
}

impl<K: AsRef<str>> Index<K> for Octothorpe {
    type Output = AnyValue;

    /// Same as `get`, with [`AnyValue::nil`] standing in for a missing key
    fn index(&self, key: K) -> &AnyValue {
        self.get(key).unwrap_or(AnyValue::nil())
    }
}

impl<'a> IntoIterator for &'a Octothorpe {
    type Item = (&'a Key, &'a AnyValue);
    type IntoIter = Iter<'a, Key, AnyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.store.iter()
    }
}

impl<K: Into<Key>, V: Value> FromIterator<(K, V)> for Octothorpe {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        Self::from_store(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), AnyValue::new(value)))
                .collect(),
        )
    }
}

/// Pairs are compared as a set; key order and frozen state don't matter.
impl PartialEq for Octothorpe {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store
    }
}

/// Containment, not a total order: `a < b` means `a` is a strict subset of `b`,
/// and two Octothorpes that each hold a pair the other lacks are incomparable.
impl PartialOrd for Octothorpe {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.store == other.store {
            Some(Ordering::Equal)
        } else if contains(&other.store, &self.store) {
            Some(Ordering::Less)
        } else if contains(&self.store, &other.store) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

impl fmt::Debug for Octothorpe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.store.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn sample() -> Octothorpe {
        Octothorpe::try_new(vec![
            (Key::from("one"), AnyValue::new("a")),
            (Key::from("two"), AnyValue::new(2i32)),
            (Key::from("dup"), AnyValue::new(3i32)),
            (Key::from("weird key"), AnyValue::new(4i32)),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_is_empty() {
        let ot = Octothorpe::new();
        assert!(ot.is_empty());
        assert!(!ot.is_frozen());
        assert_eq!(ot.to_h(), Hash::new());
    }

    #[test]
    fn test_absent_source_is_empty() -> Result<()> {
        let ot = Octothorpe::try_new(None::<Vec<(&str, i32)>>)?;
        assert!(ot.is_empty());
        Ok(())
    }

    #[test]
    fn test_get_normalizes() {
        let ot = sample();

        assert_eq!(ot.get("two"), Some(&AnyValue::new(2i32)));
        assert_eq!(ot.get(Key::from("two")), ot.get("two"));
        assert_eq!(ot.get("two".to_string()), ot.get("two"));
        assert_eq!(ot.get_as::<&str>("one"), Some(&"a"));
        assert_eq!(ot.get_as::<i32>("weird key"), Some(&4));
        assert_eq!(ot.get("three"), None);
        assert_eq!(ot.get_as::<String>("one"), None);
    }

    #[test]
    fn test_index_is_get() {
        let ot = sample();

        assert_eq!(&ot["one"], ot.get("one").unwrap());
        assert_eq!(&ot[Key::from("dup")], &AnyValue::new(3i32));
        assert!(ot["three"].is_nil());
    }

    fn lookup<'a>(ot: &'a Octothorpe, key: &str) -> &'a AnyValue {
        &ot[key]
    }

    #[test]
    fn test_index_borrows_from_a_local_octothorpe() {
        let ot: Octothorpe = [("one", 1i32)].into_iter().collect();

        let found = lookup(&ot, "one");
        let missing = lookup(&ot, "two");
        assert_eq!(found.downcast_ref::<i32>(), Some(&1));
        assert!(missing.is_nil());
        assert_eq!(Some(found), ot.get("one"));
    }

    #[test]
    fn test_to_h_is_a_copy() {
        let ot = sample();
        let mut hash = ot.to_h();
        hash.insert(Key::from("extra"), AnyValue::new(1i32));
        hash.shift_remove("one");

        assert_eq!(ot.len(), 4);
        assert!(ot.contains_key("one"));
        assert!(!ot.contains_key("extra"));
    }

    #[test]
    fn test_guard_returns_self_for_chaining() -> Result<()> {
        let mut ot = sample();
        ot.guard::<Vec<i32>>(["alpha"])?
            .guard::<Hash>(["beta"])?
            .guard_with(["gamma"], |key| key.to_string())?;

        assert_eq!(ot.get_as::<Vec<i32>>("alpha"), Some(&vec![]));
        assert_eq!(ot.get_as::<Hash>("beta"), Some(&Hash::new()));
        assert_eq!(ot.get_as::<String>("gamma").map(String::as_str), Some("gamma"));
        Ok(())
    }

    #[test]
    fn test_guard_skips_fill_for_present_keys() -> Result<()> {
        let mut ot = sample();
        let calls = Cell::new(0);

        ot.guard_with(["one", "weird key", "fred", "fred", "velma"], |_| {
            calls.set(calls.get() + 1);
            "jinks!"
        })?;

        assert_eq!(calls.get(), 2);
        assert_eq!(ot.get_as::<&str>("one"), Some(&"a"));
        assert_eq!(ot.get_as::<i32>("weird key"), Some(&4));
        assert_eq!(ot.get_as::<&str>("fred"), Some(&"jinks!"));
        assert_eq!(ot.get_as::<&str>("velma"), Some(&"jinks!"));
        Ok(())
    }

    #[test]
    fn test_guard_after_freeze_changes_nothing() {
        let mut ot = sample();
        ot.freeze();
        let before = ot.to_h();
        let calls = Cell::new(0);

        let result = ot.guard_with(["foo"], |_| {
            calls.set(calls.get() + 1);
            0i32
        });

        assert_eq!(result.err(), Some(OctoError::Frozen));
        assert_eq!(calls.get(), 0);
        assert_eq!(ot.to_h(), before);
    }

    #[test]
    fn test_merge_leaves_inputs_alone() -> Result<()> {
        let ot: Octothorpe = [("one", 1), ("two", 2)].into_iter().collect();
        let other: Octothorpe = [("two", 20), ("three", 30)].into_iter().collect();

        let merged = ot.merge(&other)?;

        assert_eq!(
            merged.keys().map(Key::as_str).collect::<Vec<_>>(),
            vec!["one", "two", "three"]
        );
        assert_eq!(merged.get_as::<i32>("two"), Some(&20));
        assert_eq!(ot.get_as::<i32>("two"), Some(&2));
        assert_eq!(other.len(), 2);
        Ok(())
    }

    #[test]
    fn test_merge_result_is_not_frozen() -> Result<()> {
        let mut ot = sample();
        ot.freeze();

        let mut merged = ot.merge([("fred", 1)])?;
        assert!(!merged.is_frozen());
        merged.guard::<i32>(["velma"])?;
        Ok(())
    }

    #[test]
    fn test_merge_rule_only_sees_conflicts() -> Result<()> {
        let ot: Octothorpe = [("one", 1), ("two", 2)].into_iter().collect();
        let mut seen = Vec::new();

        let merged = ot.merge_with([("two", 4), ("three", 9)], |key, old, new| {
            seen.push(key.clone());
            old.downcast_ref::<i32>().unwrap() + new.downcast_ref::<i32>().unwrap()
        })?;

        assert_eq!(seen, vec![Key::from("two")]);
        assert_eq!(merged.get_as::<i32>("two"), Some(&6));
        assert_eq!(merged.get_as::<i32>("three"), Some(&9));
        Ok(())
    }

    #[test]
    fn test_merge_rejects_absent_source() {
        let ot = sample();
        assert!(matches!(
            ot.merge(None::<Octothorpe>),
            Err(OctoError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_whitelist() {
        let ot = sample();

        let picked = ot.whitelist(["dup", "one", "four"]);
        assert_eq!(
            picked.keys().map(Key::as_str).collect::<Vec<_>>(),
            vec!["one", "dup"]
        );
        assert!(ot.whitelist(Vec::<&str>::new()).is_empty());
        assert!(Octothorpe::new().whitelist(["foo"]).is_empty());
    }

    #[test]
    fn test_query_surface() {
        let ot = sample();

        assert!(!ot.is_empty());
        assert_eq!(ot.len(), 4);
        assert!(ot.contains_key("two"));
        assert!(ot.includes(Key::from("two")));
        assert!(!ot.includes("four"));
        assert!(ot.contains_value(&3i32));
        assert!(ot.contains_value(&AnyValue::new("a")));
        assert!(!ot.contains_value(&14i32));
        assert!(!ot.contains_value(&3i64));
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let ot = sample();
        let expected = vec!["one", "two", "dup", "weird key"];

        assert_eq!(ot.keys().map(Key::as_str).collect::<Vec<_>>(), expected);
        assert_eq!(
            ot.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            expected
        );
        assert_eq!(ot.map(|(k, _)| k.to_string()), expected);

        let mut seen = Vec::new();
        for (key, _) in &ot {
            seen.push(key.as_str());
        }
        assert_eq!(seen, expected);
        assert_eq!(ot.values().next(), Some(&AnyValue::new("a")));
    }

    #[test]
    fn test_select_reject_inject() {
        let ot = sample();

        let two = ot.select(|k, _| k == "two");
        assert_eq!(two.len(), 1);
        assert_eq!(two.get("two"), Some(&AnyValue::new(2i32)));

        let rest = ot.reject(|k, _| k == "two");
        assert_eq!(
            rest.keys().map(Key::as_str).collect::<Vec<_>>(),
            vec!["one", "dup", "weird key"]
        );

        let total = ot.inject(0, |sum, _, v| sum + v.downcast_ref::<i32>().copied().unwrap_or(0));
        assert_eq!(total, 9);
    }

    #[test]
    fn test_debug_renders_as_map() {
        let ot: Octothorpe = [("one", 1)].into_iter().collect();
        assert_eq!(format!("{:?}", ot), "{\"one\": 1}");
    }
}
