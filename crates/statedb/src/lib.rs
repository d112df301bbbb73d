//! # Rotor State DB
//!
//! Hash-map access to the replicated state database where rotation
//! metadata is published for the rest of the switch to read.
//!
//! ## Backends
//!
//! - [`MemoryKvStore`]: in-process, used by tests and single-node setups
//! - `RedisKvStore`: the switch's state DB (feature `redis`)

mod error;
mod key;
mod memory;
#[cfg(feature = "redis")]
mod redis_store;
mod store;

pub use error::{KvError, KvResult};
pub use key::{CREDENTIALS_TABLE, SEPARATOR, StateKey};
pub use memory::MemoryKvStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisKvStore;
pub use store::KvStore;
