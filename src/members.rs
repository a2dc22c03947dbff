use crate::any_value::{AnyValue, Value};
use crate::error::{OctoError, Result};
use crate::source::Hash;
use std::fmt;

/// A read-only view for reading an Octothorpe's members by name.
///
/// This is the dotted, struct-like way in: `ot.members().read("two")` reads
/// the member `two`. It borrows the Octothorpe, so it always sees its current
/// contents. Use [`Octothorpe::get`](crate::Octothorpe::get) for keys that are
/// awkward as names, such as keys with spaces.
///
/// ```
/// use octothorpe::{MemberCall, OctoError, Octothorpe};
///
/// let ot: Octothorpe = [("one", 1), ("two", 2)].into_iter().collect();
/// let members = ot.members();
///
/// assert_eq!(members.read_as::<i32>("two"), Some(&2));
/// assert!(members.read("three").is_none());
///
/// // a member is a plain read, not a method
/// let call = MemberCall::new().arg(1);
/// assert!(matches!(members.send("two", call), Err(OctoError::InvalidAccess { .. })));
/// ```
#[derive(Clone, Copy)]
pub struct Members<'a> {
    store: &'a Hash,
}

impl<'a> Members<'a> {
    pub(crate) fn new(store: &'a Hash) -> Self {
        Self { store }
    }

    /// The member's value, or `None` if there is no such member
    pub fn read(&self, name: &str) -> Option<&'a AnyValue> {
        self.store.get(name)
    }

    pub fn read_as<T: 'static>(&self, name: &str) -> Option<&'a T> {
        self.read(name)?.downcast_ref::<T>()
    }

    /// Sends a member access as a general call.
    ///
    /// A call without arguments or a block is the same as [`read`](Members::read).
    ///
    /// This is not a second spelling of
    /// [`Octothorpe::get`](crate::Octothorpe::get). It lives on the member view
    /// and checks the call's shape: a member is a plain read, so it takes nothing.
    ///
    /// # Errors
    ///
    /// Returns `OctoError::InvalidAccess` if the call carries any argument or a
    /// block. The block is never run.
    pub fn send(&self, name: &str, call: MemberCall<'_>) -> Result<Option<&'a AnyValue>> {
        if !call.args.is_empty() {
            let count = call.args.len();
            return Err(OctoError::InvalidAccess {
                member: name.to_string(),
                reason: format!(
                    "got {} argument{}",
                    count,
                    if count == 1 { "" } else { "s" }
                ),
            });
        }
        if call.block.is_some() {
            return Err(OctoError::InvalidAccess {
                member: name.to_string(),
                reason: "got a block".to_string(),
            });
        }
        Ok(self.read(name))
    }
}

impl fmt::Debug for Members<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.store.keys()).finish()
    }
}

/// The shape of a member access: positional arguments and an optional block.
#[derive(Default)]
pub struct MemberCall<'c> {
    args: Vec<AnyValue>,
    block: Option<Box<dyn Fn(&AnyValue) + 'c>>,
}

impl<'c> MemberCall<'c> {
    /// A plain access, with no arguments and no block
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg<T: Value>(mut self, value: T) -> Self {
        self.args.push(AnyValue::new(value));
        self
    }

    pub fn block(mut self, block: impl Fn(&AnyValue) + 'c) -> Self {
        self.block = Some(Box::new(block));
        self
    }
}

impl fmt::Debug for MemberCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberCall")
            .field("args", &self.args)
            .field("block", &self.block.is_some())
            .finish()
    }
}
