//! # statehub
//!
//! An in-process store for one shared application state. Producers change
//! the state only through named modifiers; consumers subscribe to paths of
//! the state and are told when the value there changes.
//!
//! ## Core Concepts
//!
//! - **Modifiers**: closures registered under an action name, the only way to
//!   mutate the state
//! - **Actions**: a name plus an optional JSON payload, dispatched to the
//!   matching modifier
//! - **Snapshots**: isolated copies of the state handed out to readers
//! - **Listeners**: channels notified when the value at a dotted path changes
//!
//! ## Example
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use statehub::{Action, ModifierResult, Store};
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let store = Store::new(User { name: "Zandor".into(), age: 40 });
//! store.add_modifier("ADD_AGE", |user: &mut User, years: u32| -> ModifierResult {
//!     user.age += years;
//!     Ok(())
//! })?;
//!
//! let ages = store.add_listener("age")?;
//! store.dispatch(Action::with_payload("ADD_AGE", 10))?;
//!
//! assert_eq!(store.get_state()?.age, 50);
//! assert_eq!(ages.try_recv().unwrap().decode::<u32>()?, 50);
//! # Ok::<(), statehub::StoreError>(())
//! ```

pub mod error;
pub mod listeners;
mod modifiers;
pub mod path;
pub mod snapshot;
pub mod store;
pub mod types;

// Re-exports
pub use error::{ModifierError, Result, StoreError};
pub use listeners::{Listener, ListenerError, Notification, StateSide};
pub use modifiers::ModifierResult;
pub use path::{Path, ResolveError, Seg, ROOT_PATH};
pub use snapshot::{deep_clone, Change, ChangeKind, CloneStrategy, Differ};
pub use store::{State, Store, StoreConfig};
pub use types::*;
