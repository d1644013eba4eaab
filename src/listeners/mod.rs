//! Path-scoped change listeners.
//!
//! A listener subscribes to one path of the state. After every mutation the
//! store evaluates all listeners concurrently; a listener whose path now
//! holds a different value receives a [`Notification`] with the new value.
//!
//! Delivery is best-effort:
//! - at most one notification per listener per mutation
//! - a listener whose channel is full misses the notification
//! - a path that cannot be resolved yields an error notification
//!
//! # Example
//!
//! ```ignore
//! let listener = store.add_listener("Address.City")?;
//!
//! std::thread::spawn(move || {
//!     for note in listener.iter() {
//!         match note.error {
//!             Some(err) => eprintln!("listener error: {err}"),
//!             None => println!("city is now {:?}", note.data),
//!         }
//!     }
//! });
//! ```

mod registry;
mod types;

pub(crate) use registry::ListenerRegistry;
pub use types::{Listener, ListenerError, Notification, StateSide};
