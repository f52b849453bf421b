//! Method swizzling over an explicit dispatch-table object runtime.
//!
//! Rust has no open dynamic-dispatch runtime to patch, so this crate carries
//! its own: classes registered in a [`Runtime`] each own a mutable table
//! mapping interned [`Selector`]s to implementations, and message sends
//! resolve through that table, walking the ancestor chain when the receiving
//! class has no local entry. [`Runtime::swizzle_method`] then edits those
//! tables in place — exchanging two entries when the class implements the
//! original selector directly, or rebinding the original to the replacement
//! while preserving its prior resolution under a fallback name.
//!
//! # Example
//!
//! ```
//! use swizzler::{Runtime, Value};
//!
//! let rt = Runtime::new();
//! let animal = rt.define_class("Animal", None).unwrap();
//! let speak = rt.selector("speak");
//! let greet = rt.selector("greet");
//! let backup = rt.selector("backupSpeak");
//! rt.define_method(animal, speak, |_recv, _args| Value::from("A")).unwrap();
//! rt.define_method(animal, greet, |_recv, _args| Value::from("B")).unwrap();
//!
//! rt.swizzle_method(animal, speak, greet, backup).unwrap();
//!
//! let pet = rt.instantiate(animal).unwrap();
//! assert_eq!(rt.send(&pet, speak, &[]).unwrap(), Value::from("B"));
//! assert_eq!(rt.send(&pet, greet, &[]).unwrap(), Value::from("A"));
//! ```

mod error;
mod runtime;
mod selector;
mod swizzle;
mod types;

pub use error::{Result, SwizzleError};
pub use runtime::{ClassId, Object, Runtime};
pub use selector::Selector;
pub use types::{Imp, Value};
