//! # octothorpe
//!
//! A very simple, read-only hash for passing messages between components.
//!
//! An [`Octothorpe`] takes anything hash-like, normalizes its keys, and then
//! hands out read access to it. It borrows a little from struct-like records:
//! values can be read by member name as well as by key.
//!
//! ## Key Features
//!
//! - **Normalized keys**: text keys and [`Key`]s with the same spelling are the same key
//! - **Read-only**: no setters; `merge` and `whitelist` return new Octothorpes
//! - **Guards**: fill in defaults for keys the sender left out, then `freeze`
//! - **Containment comparisons**: subset, superset and equality against plain maps
//! - **Any value**: values of any `Debug + PartialEq + Send + Sync` type, side by side
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use octothorpe::{AnyValue, Key, OctoError, Octothorpe};
//!
//! fn main() -> Result<(), OctoError> {
//!     let ot = Octothorpe::try_new(vec![
//!         (Key::from("one"), AnyValue::new(1)),
//!         (Key::from("two"), AnyValue::new("two")),
//!         (Key::from("weird key"), AnyValue::new(3.0)),
//!     ])?;
//!
//!     // Read by member name, or by key
//!     assert_eq!(ot.members().read_as::<i32>("one"), Some(&1));
//!     assert_eq!(ot.get_as::<&str>("two"), Some(&"two"));
//!     assert_eq!(ot.get_as::<f64>("weird key"), Some(&3.0));
//!
//!     // A missing key is not an error
//!     assert!(ot.get("three").is_none());
//!     assert!(ot["three"].is_nil());
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Guarding Against Missing Keys
//!
//! ```rust
//! use octothorpe::{OctoError, Octothorpe};
//!
//! fn main() -> Result<(), OctoError> {
//!     let mut ot: Octothorpe = [("one", 1), ("two", 2)].into_iter().collect();
//!
//!     // Each key that is missing is set; present keys are left alone
//!     ot.guard::<Vec<String>>(["three"])?
//!         .guard_with(["four", "one"], |key| format!("no {}", key))?;
//!
//!     // Optional: make it truly read-only
//!     ot.freeze();
//!
//!     assert_eq!(ot.get_as::<Vec<String>>("three"), Some(&vec![]));
//!     assert_eq!(ot.get_as::<String>("four").map(String::as_str), Some("no four"));
//!     assert_eq!(ot.get_as::<i32>("one"), Some(&1));
//!
//!     match ot.guard::<Vec<String>>(["five"]) {
//!         Err(OctoError::Frozen) => println!("frozen, as expected"),
//!         other => panic!("unexpected: {:?}", other),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Merging and Comparing
//!
//! ```rust
//! use octothorpe::{OctoError, Octothorpe};
//! use std::collections::HashMap;
//!
//! fn main() -> Result<(), OctoError> {
//!     let ot: Octothorpe = [("one", 1), ("two", 2)].into_iter().collect();
//!
//!     let merged = ot.merge([("two", 20), ("three", 30)])?;
//!     assert_eq!(merged.get_as::<i32>("two"), Some(&20));
//!     assert_eq!(ot.get_as::<i32>("two"), Some(&2));
//!
//!     let mut plain = HashMap::new();
//!     plain.insert("one", 1);
//!
//!     assert!(ot.is_strict_superset_of(&plain)?);
//!     assert!(ot < ot.merge([("three", 3)])?);
//!     assert!(ot.whitelist(["one"]).equals(plain));
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Error Handling
//!
//! JSON sources need the `json` feature, which is on by default.
//!
//! ```rust
//! # #[cfg(feature = "json")]
//! # fn main() {
//! use octothorpe::{OctoError, Octothorpe};
//! use serde_json::json;
//!
//! // A JSON object is hash-like; null is nothing at all
//! let ot = Octothorpe::try_new(json!({"one": 1})).unwrap();
//! assert!(Octothorpe::try_new(json!(null)).unwrap().is_empty());
//!
//! match Octothorpe::try_new(json!("hello")) {
//!     Ok(_) => println!("unexpected"),
//!     Err(OctoError::InvalidSource(what)) => println!("not a hash: {}", what),
//!     Err(e) => println!("Other error: {}", e),
//! }
//!
//! // Merging needs something to merge with
//! assert!(matches!(ot.merge(json!(null)), Err(OctoError::InvalidSource(_))));
//! # }
//! # #[cfg(not(feature = "json"))]
//! # fn main() {}
//! ```

mod any_value;
mod error;
mod key;
mod members;
mod octothorpe;
mod source;

pub use any_value::{AnyValue, Value};
pub use error::{OctoError, Result};
pub use key::Key;
pub use members::{MemberCall, Members};
pub use octothorpe::Octothorpe;
pub use source::{Hash, HashLike};

/// The crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
