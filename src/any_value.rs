use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, LazyLock};

type Payload = dyn Any + Send + Sync;

/// Anything that can be stored in an Octothorpe.
///
/// Implemented for every `'static` type that is `Debug + PartialEq + Send + Sync`,
/// which covers the standard scalars, strings, collections of those, and nested
/// Octothorpes. Values are opaque to the map; `PartialEq` is only used by the
/// comparison operators and `Debug` only for display.
pub trait Value: Any + fmt::Debug + PartialEq + Send + Sync {}

impl<T> Value for T where T: Any + fmt::Debug + PartialEq + Send + Sync {}

static NIL: LazyLock<AnyValue> = LazyLock::new(|| AnyValue::new(()));

/// A container for type-erased values that preserves type information
///
/// The payload is shared, so cloning an `AnyValue` (and therefore copying an
/// Octothorpe, merging, or whitelisting) never copies the value itself.
/// Two `AnyValue`s are equal when they hold the same concrete type and the
/// payloads compare equal with that type's `PartialEq`.
#[derive(Clone)]
pub struct AnyValue {
    type_id: TypeId,
    type_name: &'static str,
    value: Arc<Payload>,
    eq: fn(&Payload, &Payload) -> bool,
    fmt: fn(&Payload, &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl AnyValue {
    /// Wrap a value.
    ///
    /// Wrapping an `AnyValue` returns a copy of it rather than nesting it, so
    /// callbacks may hand back either a plain value or one they were given.
    ///
    /// ```
    /// use octothorpe::AnyValue;
    ///
    /// let one = AnyValue::new(1i32);
    /// assert_eq!(AnyValue::new(one.clone()), one);
    /// assert_eq!(one.downcast_ref::<i32>(), Some(&1));
    /// ```
    pub fn new<T: Value>(value: T) -> Self {
        let any: &dyn Any = &value;
        if let Some(inner) = any.downcast_ref::<AnyValue>() {
            return inner.clone();
        }

        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
            eq: eq_as::<T>,
            fmt: fmt_as::<T>,
        }
    }

    /// The "no value" sentinel, returned by index access for absent keys
    pub fn nil() -> &'static AnyValue {
        &NIL
    }

    /// True for the sentinel (and for a stored `()`)
    pub fn is_nil(&self) -> bool {
        self.is::<()>()
    }

    /// The `TypeId` of the wrapped value
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The type name of the wrapped value, for diagnostics only
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check if the contained value is of type T
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Get a reference to the contained value if it is of type T
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

fn eq_as<T: Value>(a: &Payload, b: &Payload) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn fmt_as<T: Value>(value: &Payload, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value.downcast_ref::<T>() {
        Some(value) => fmt::Debug::fmt(value, f),
        None => f.write_str("<?>"),
    }
}

impl PartialEq for AnyValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && (self.eq)(&*self.value, &*other.value)
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.fmt)(&*self.value, f)
    }
}
