//! Key-Value store port.

use crate::{Batch, Command, Reply, StoreError, Ttl};

/// A Key-Value store able to run command batches atomically.
///
/// Backends implement [`KvStore::execute`]; every other method is a thin
/// single-command wrapper around it with a typed reply.
///
/// # Example
///
/// ```rust
/// use turbo_kv::{KvStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.hset("item:1", vec![("type".into(), "Bottle".into())]).unwrap();
/// assert_eq!(store.hget("item:1", "type").unwrap().as_deref(), Some("Bottle"));
/// ```
pub trait KvStore: Send + Sync {
    /// Execute `commands` as one atomic unit.
    ///
    /// Returns one reply per command, in order. If any command fails, none of
    /// them take effect and the error is returned.
    fn execute(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError>;

    /// Execute a [`Batch`] atomically.
    fn exec(&self, batch: Batch) -> Result<Vec<Reply>, StoreError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        self.execute(batch.into_commands())
    }

    /// Execute a single command.
    fn run(&self, command: Command) -> Result<Reply, StoreError> {
        let replies = self.execute(vec![command])?;
        let received = replies.len();
        match replies.into_iter().next() {
            Some(reply) if received == 1 => Ok(reply),
            _ => Err(StoreError::ReplyCount { sent: 1, received }),
        }
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.run(Command::Get { key: key.into() })?
            .into_optional_value()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.run(Command::Set {
            key: key.into(),
            value: value.into(),
        })?
        .into_ok()
    }

    fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.run(Command::Incr { key: key.into() })?.into_integer()
    }

    /// Delete a key. Returns whether it existed.
    fn del(&self, key: &str) -> Result<bool, StoreError> {
        self.run(Command::Del { key: key.into() })?.into_bool()
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.run(Command::Exists { key: key.into() })?.into_bool()
    }

    /// Set a time to live. Returns false when the key does not exist.
    fn expire(&self, key: &str, seconds: u64) -> Result<bool, StoreError> {
        self.run(Command::Expire {
            key: key.into(),
            seconds,
        })?
        .into_bool()
    }

    fn ttl(&self, key: &str) -> Result<Ttl, StoreError> {
        self.run(Command::Ttl { key: key.into() })?
            .into_integer()
            .map(Ttl::from_reply)
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), StoreError> {
        self.run(Command::Rename {
            from: from.into(),
            to: to.into(),
        })?
        .into_ok()
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        self.run(Command::Keys {
            pattern: pattern.into(),
        })?
        .into_values()
    }

    /// Add a set member. Returns whether it was newly added.
    fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.run(Command::SAdd {
            key: key.into(),
            member: member.into(),
        })?
        .into_bool()
    }

    /// Remove a set member. Returns whether it was present.
    fn srem(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.run(Command::SRem {
            key: key.into(),
            member: member.into(),
        })?
        .into_bool()
    }

    fn sismember(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.run(Command::SIsMember {
            key: key.into(),
            member: member.into(),
        })?
        .into_bool()
    }

    fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.run(Command::SMembers { key: key.into() })?
            .into_values()
    }

    fn scard(&self, key: &str) -> Result<u64, StoreError> {
        self.run(Command::SCard { key: key.into() })?
            .into_integer()
            .map(|n| n.max(0) as u64)
    }

    /// Write map fields. Returns how many fields were newly created.
    fn hset(&self, key: &str, fields: Vec<(String, String)>) -> Result<i64, StoreError> {
        self.run(Command::HSet {
            key: key.into(),
            fields,
        })?
        .into_integer()
    }

    /// Remove a map field. Returns whether it was present.
    fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.run(Command::HDel {
            key: key.into(),
            field: field.into(),
        })?
        .into_bool()
    }

    fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.run(Command::HGet {
            key: key.into(),
            field: field.into(),
        })?
        .into_optional_value()
    }

    /// Read every field of a map. Empty when the key does not exist.
    fn hgetall(&self, key: &str) -> Result<Vec<(String, String)>, StoreError> {
        self.run(Command::HGetAll { key: key.into() })?
            .into_fields()
    }

    fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        self.run(Command::HIncrBy {
            key: key.into(),
            field: field.into(),
            delta,
        })?
        .into_integer()
    }
}

impl<T: KvStore + ?Sized> KvStore for std::sync::Arc<T> {
    fn execute(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError> {
        (**self).execute(commands)
    }
}
