//! Key-Value store port for TurboCart.
//!
//! Cart state lives in a Redis-like store: strings, sets and field maps with
//! per-key expiry and renaming. This crate defines the command set, the
//! [`KvStore`] trait backends implement, and [`MemoryStore`], an in-process
//! backend used for development and tests.
//!
//! Every call goes through [`KvStore::execute`], which runs a batch of
//! commands as one atomic unit. Single commands are just one-element batches.
//!
//! # Example
//!
//! ```rust
//! use turbo_kv::{Batch, KvStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let id = store.incr("item:id")?;
//!
//! let mut batch = Batch::new();
//! batch
//!     .hset(format!("item:{id}"), vec![("type".into(), "Bottle".into())])
//!     .sadd("cart:42", id.to_string());
//! store.exec(batch)?;
//!
//! assert_eq!(store.scard("cart:42")?, 1);
//! # Ok::<(), turbo_kv::StoreError>(())
//! ```

mod command;
mod error;
mod memory;
mod store;

pub use command::{Batch, Command, Reply, Ttl};
pub use error::StoreError;
pub use memory::{Clock, ManualClock, MemoryStore, SystemClock};
pub use store::KvStore;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Batch, KvStore, MemoryStore, StoreError, Ttl};
}
