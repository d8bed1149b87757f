//! Store commands, replies and atomic batches.

use crate::StoreError;
use std::fmt;

/// A single store primitive.
///
/// The command set is the minimum a cart needs: strings, sets, field maps,
/// expiry and renaming. Backends translate each variant into their own
/// protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read a string value.
    Get { key: String },
    /// Write a string value, clearing any expiry.
    Set { key: String, value: String },
    /// Atomically increment an integer string, creating it at 0.
    Incr { key: String },
    /// Delete a key of any kind.
    Del { key: String },
    /// Test whether a key exists.
    Exists { key: String },
    /// Set a key's time to live in seconds.
    Expire { key: String, seconds: u64 },
    /// Read a key's remaining time to live.
    Ttl { key: String },
    /// Rename a key, overwriting the destination.
    Rename { from: String, to: String },
    /// List keys matching a glob pattern (`*`, `?`).
    Keys { pattern: String },
    /// Add a member to a set.
    SAdd { key: String, member: String },
    /// Remove a member from a set.
    SRem { key: String, member: String },
    /// Test set membership.
    SIsMember { key: String, member: String },
    /// List all members of a set.
    SMembers { key: String },
    /// Count the members of a set.
    SCard { key: String },
    /// Write one or more fields of a map.
    HSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    /// Remove a field from a map.
    HDel { key: String, field: String },
    /// Read one field of a map.
    HGet { key: String, field: String },
    /// Read every field of a map.
    HGetAll { key: String },
    /// Atomically increment an integer map field, creating it at 0.
    HIncrBy {
        key: String,
        field: String,
        delta: i64,
    },
}

impl Command {
    /// Short command name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Get { .. } => "GET",
            Command::Set { .. } => "SET",
            Command::Incr { .. } => "INCR",
            Command::Del { .. } => "DEL",
            Command::Exists { .. } => "EXISTS",
            Command::Expire { .. } => "EXPIRE",
            Command::Ttl { .. } => "TTL",
            Command::Rename { .. } => "RENAME",
            Command::Keys { .. } => "KEYS",
            Command::SAdd { .. } => "SADD",
            Command::SRem { .. } => "SREM",
            Command::SIsMember { .. } => "SISMEMBER",
            Command::SMembers { .. } => "SMEMBERS",
            Command::SCard { .. } => "SCARD",
            Command::HSet { .. } => "HSET",
            Command::HDel { .. } => "HDEL",
            Command::HGet { .. } => "HGET",
            Command::HGetAll { .. } => "HGETALL",
            Command::HIncrBy { .. } => "HINCRBY",
        }
    }
}

/// Reply to a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// No value.
    Nil,
    /// Command succeeded with nothing to report.
    Ok,
    /// Integer reply (counts, booleans as 0/1, counters).
    Integer(i64),
    /// A single string value.
    Value(String),
    /// A list of strings (set members, key names).
    Values(Vec<String>),
    /// Field/value pairs of a map.
    Fields(Vec<(String, String)>),
}

impl Reply {
    fn unexpected(&self, expected: &'static str) -> StoreError {
        StoreError::UnexpectedReply {
            expected,
            got: self.to_string(),
        }
    }

    /// Interpret as an integer.
    pub fn into_integer(self) -> Result<i64, StoreError> {
        match self {
            Reply::Integer(n) => Ok(n),
            other => Err(other.unexpected("integer")),
        }
    }

    /// Interpret an integer reply as a boolean (non-zero is true).
    pub fn into_bool(self) -> Result<bool, StoreError> {
        self.into_integer().map(|n| n != 0)
    }

    /// Interpret as an optional string.
    pub fn into_optional_value(self) -> Result<Option<String>, StoreError> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Value(v) => Ok(Some(v)),
            other => Err(other.unexpected("value or nil")),
        }
    }

    /// Interpret as a list of strings.
    pub fn into_values(self) -> Result<Vec<String>, StoreError> {
        match self {
            Reply::Values(v) => Ok(v),
            other => Err(other.unexpected("values")),
        }
    }

    /// Interpret as map fields.
    pub fn into_fields(self) -> Result<Vec<(String, String)>, StoreError> {
        match self {
            Reply::Fields(f) => Ok(f),
            other => Err(other.unexpected("fields")),
        }
    }

    /// Interpret as a plain acknowledgement.
    pub fn into_ok(self) -> Result<(), StoreError> {
        match self {
            Reply::Ok => Ok(()),
            other => Err(other.unexpected("ok")),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Nil => write!(f, "nil"),
            Reply::Ok => write!(f, "OK"),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Value(v) => write!(f, "{:?}", v),
            Reply::Values(v) => write!(f, "({} values)", v.len()),
            Reply::Fields(v) => write!(f, "({} fields)", v.len()),
        }
    }
}

/// Remaining lifetime of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The key does not exist.
    Missing,
    /// The key exists and never expires.
    Persistent,
    /// The key expires in this many seconds.
    Seconds(u64),
}

impl Ttl {
    /// Decode the integer convention used by Redis-like stores
    /// (`-2` missing, `-1` persistent).
    pub fn from_reply(n: i64) -> Self {
        match n {
            n if n >= 0 => Ttl::Seconds(n as u64),
            -1 => Ttl::Persistent,
            _ => Ttl::Missing,
        }
    }

    /// Encode with the Redis-like integer convention.
    pub fn to_reply(self) -> i64 {
        match self {
            Ttl::Missing => -2,
            Ttl::Persistent => -1,
            Ttl::Seconds(s) => s as i64,
        }
    }

    /// Remaining seconds, if the key expires.
    pub fn seconds(self) -> Option<u64> {
        match self {
            Ttl::Seconds(s) => Some(s),
            _ => None,
        }
    }
}

/// Commands executed together as one atomic unit.
///
/// # Example
///
/// ```rust
/// use turbo_kv::{Batch, KvStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// let mut batch = Batch::new();
/// batch.sadd("cart:1", "7").set("cart:1:index:Bottle:17", "7");
/// store.exec(batch).unwrap();
/// assert!(store.sismember("cart:1", "7").unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    commands: Vec<Command>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an arbitrary command.
    pub fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(Command::Set {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn del(&mut self, key: impl Into<String>) -> &mut Self {
        self.push(Command::Del { key: key.into() })
    }

    pub fn expire(&mut self, key: impl Into<String>, seconds: u64) -> &mut Self {
        self.push(Command::Expire {
            key: key.into(),
            seconds,
        })
    }

    pub fn rename(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.push(Command::Rename {
            from: from.into(),
            to: to.into(),
        })
    }

    pub fn sadd(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.push(Command::SAdd {
            key: key.into(),
            member: member.into(),
        })
    }

    pub fn srem(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.push(Command::SRem {
            key: key.into(),
            member: member.into(),
        })
    }

    pub fn hset(&mut self, key: impl Into<String>, fields: Vec<(String, String)>) -> &mut Self {
        self.push(Command::HSet {
            key: key.into(),
            fields,
        })
    }

    pub fn hincrby(
        &mut self,
        key: impl Into<String>,
        field: impl Into<String>,
        delta: i64,
    ) -> &mut Self {
        self.push(Command::HIncrBy {
            key: key.into(),
            field: field.into(),
            delta,
        })
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Queued commands, in order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Consume the batch into its commands.
    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_reply_convention() {
        assert_eq!(Ttl::from_reply(-2), Ttl::Missing);
        assert_eq!(Ttl::from_reply(-1), Ttl::Persistent);
        assert_eq!(Ttl::from_reply(30), Ttl::Seconds(30));
        assert_eq!(Ttl::Seconds(30).to_reply(), 30);
        assert_eq!(Ttl::Missing.seconds(), None);
    }

    #[test]
    fn test_reply_conversion_mismatch() {
        let err = Reply::Value("x".to_string()).into_integer().unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnexpectedReply {
                expected: "integer",
                ..
            }
        ));
        assert!(!Reply::Integer(0).into_bool().unwrap());
        assert_eq!(Reply::Nil.into_optional_value().unwrap(), None);
    }

    #[test]
    fn test_batch_builder_preserves_order() {
        let mut batch = Batch::new();
        batch.sadd("s", "a").del("k").expire("s", 10);
        let names: Vec<_> = batch.commands().iter().map(Command::name).collect();
        assert_eq!(names, vec!["SADD", "DEL", "EXPIRE"]);
        assert_eq!(batch.len(), 3);
        assert!(Batch::new().is_empty());
    }
}
