//! In-process store backend.
//!
//! Implements the command set with Redis-like semantics: empty sets and maps
//! cease to exist, `SET` clears a key's expiry, `RENAME` carries it over and
//! overwrites the destination, `EXPIRE 0` deletes.

use crate::{Command, KvStore, Reply, StoreError};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, trace};

/// Source of the current time, in milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to. Used in tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(start_millis),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Set(BTreeSet<String>),
    Hash(BTreeMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<u64>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

type Data = HashMap<String, Entry>;

/// Store backed by process memory.
///
/// All data lives behind a single lock; a batch holds it for its whole
/// duration. Multi-command batches record the prior entry of every key they
/// name and restore those entries if a command fails, so a batch costs time
/// in proportion to the keys it touches, not to the size of the store.
///
/// Expired keys are dropped lazily when a command names them, or by `KEYS`.
///
/// # Example
///
/// ```rust
/// use turbo_kv::{KvStore, MemoryStore, Ttl};
///
/// let store = MemoryStore::new();
/// store.sadd("cart:1", "1").unwrap();
/// store.expire("cart:1", 60).unwrap();
/// assert_eq!(store.ttl("cart:1").unwrap(), Ttl::Seconds(60));
/// ```
pub struct MemoryStore {
    data: Mutex<Data>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Create an empty store on the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store on a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = self.clock.now_millis();
        self.data
            .lock()
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    /// Whether the store holds no live keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every key.
    pub fn flush(&self) {
        self.data.lock().clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("keys", &self.data.lock().len())
            .finish()
    }
}

impl KvStore for MemoryStore {
    fn execute(&self, commands: Vec<Command>) -> Result<Vec<Reply>, StoreError> {
        let now = self.clock.now_millis();
        let mut data = self.data.lock();

        trace!(commands = commands.len(), "executing batch");

        // A single command validates before it mutates, so it needs no undo log.
        let staged = commands.len() > 1;
        let mut undo: HashMap<String, Option<Entry>> = HashMap::new();
        let mut replies = Vec::with_capacity(commands.len());
        for command in commands {
            if matches!(command, Command::Keys { .. }) {
                data.retain(|_, entry| !entry.is_expired(now));
            }
            for key in named_keys(&command) {
                if data.get(key).is_some_and(|entry| entry.is_expired(now)) {
                    data.remove(key);
                }
                if staged && !undo.contains_key(key) {
                    undo.insert(key.to_string(), data.get(key).cloned());
                }
            }

            let name = command.name();
            match apply(&mut data, command, now) {
                Ok(reply) => replies.push(reply),
                Err(e) => {
                    debug!(command = name, error = %e, restored = undo.len(), "batch aborted");
                    rollback(&mut data, undo);
                    return Err(e);
                }
            }
        }
        Ok(replies)
    }
}

/// Keys a command reads or writes. `KEYS` names none.
fn named_keys(command: &Command) -> Vec<&str> {
    match command {
        Command::Rename { from, to } => vec![from.as_str(), to.as_str()],
        Command::Keys { .. } => Vec::new(),
        Command::Get { key }
        | Command::Set { key, .. }
        | Command::Incr { key }
        | Command::Del { key }
        | Command::Exists { key }
        | Command::Expire { key, .. }
        | Command::Ttl { key }
        | Command::SAdd { key, .. }
        | Command::SRem { key, .. }
        | Command::SIsMember { key, .. }
        | Command::SMembers { key }
        | Command::SCard { key }
        | Command::HSet { key, .. }
        | Command::HDel { key, .. }
        | Command::HGet { key, .. }
        | Command::HGetAll { key }
        | Command::HIncrBy { key, .. } => vec![key.as_str()],
    }
}

fn rollback(data: &mut Data, undo: HashMap<String, Option<Entry>>) {
    for (key, previous) in undo {
        match previous {
            Some(entry) => {
                data.insert(key, entry);
            }
            None => {
                data.remove(&key);
            }
        }
    }
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
    }
}

fn set_mut<'a>(data: &'a mut Data, key: &str) -> Result<&'a mut BTreeSet<String>, StoreError> {
    let entry = data
        .entry(key.to_string())
        .or_insert_with(|| Entry::new(Value::Set(BTreeSet::new())));
    match &mut entry.value {
        Value::Set(set) => Ok(set),
        _ => Err(wrong_type(key)),
    }
}

fn hash_mut<'a>(
    data: &'a mut Data,
    key: &str,
) -> Result<&'a mut BTreeMap<String, String>, StoreError> {
    let entry = data
        .entry(key.to_string())
        .or_insert_with(|| Entry::new(Value::Hash(BTreeMap::new())));
    match &mut entry.value {
        Value::Hash(hash) => Ok(hash),
        _ => Err(wrong_type(key)),
    }
}

fn set_ref<'a>(data: &'a Data, key: &str) -> Result<Option<&'a BTreeSet<String>>, StoreError> {
    match data.get(key).map(|e| &e.value) {
        None => Ok(None),
        Some(Value::Set(set)) => Ok(Some(set)),
        Some(_) => Err(wrong_type(key)),
    }
}

fn hash_ref<'a>(
    data: &'a Data,
    key: &str,
) -> Result<Option<&'a BTreeMap<String, String>>, StoreError> {
    match data.get(key).map(|e| &e.value) {
        None => Ok(None),
        Some(Value::Hash(hash)) => Ok(Some(hash)),
        Some(_) => Err(wrong_type(key)),
    }
}

fn parse_integer(key: &str, raw: &str) -> Result<i64, StoreError> {
    raw.parse::<i64>().map_err(|_| StoreError::NotAnInteger {
        key: key.to_string(),
    })
}

fn drop_if_empty(data: &mut Data, key: &str) {
    let empty = match data.get(key).map(|e| &e.value) {
        Some(Value::Set(set)) => set.is_empty(),
        Some(Value::Hash(hash)) => hash.is_empty(),
        _ => false,
    };
    if empty {
        data.remove(key);
    }
}

fn flag(b: bool) -> Reply {
    Reply::Integer(i64::from(b))
}

fn apply(data: &mut Data, command: Command, now: u64) -> Result<Reply, StoreError> {
    match command {
        Command::Get { key } => match data.get(&key).map(|e| &e.value) {
            None => Ok(Reply::Nil),
            Some(Value::Str(s)) => Ok(Reply::Value(s.clone())),
            Some(_) => Err(wrong_type(&key)),
        },
        Command::Set { key, value } => {
            data.insert(key, Entry::new(Value::Str(value)));
            Ok(Reply::Ok)
        }
        Command::Incr { key } => {
            let next = match data.get(&key).map(|e| &e.value) {
                None => 1,
                Some(Value::Str(s)) => parse_integer(&key, s)?
                    .checked_add(1)
                    .ok_or_else(|| StoreError::NotAnInteger { key: key.clone() })?,
                Some(_) => return Err(wrong_type(&key)),
            };
            let entry = data
                .entry(key)
                .or_insert_with(|| Entry::new(Value::Str(String::new())));
            entry.value = Value::Str(next.to_string());
            Ok(Reply::Integer(next))
        }
        Command::Del { key } => Ok(flag(data.remove(&key).is_some())),
        Command::Exists { key } => Ok(flag(data.contains_key(&key))),
        Command::Expire { key, seconds } => {
            if seconds == 0 {
                return Ok(flag(data.remove(&key).is_some()));
            }
            match data.get_mut(&key) {
                Some(entry) => {
                    entry.expires_at = Some(now.saturating_add(seconds.saturating_mul(1000)));
                    Ok(flag(true))
                }
                None => Ok(flag(false)),
            }
        }
        Command::Ttl { key } => {
            let ttl = match data.get(&key) {
                None => -2,
                Some(Entry {
                    expires_at: None, ..
                }) => -1,
                Some(Entry {
                    expires_at: Some(at),
                    ..
                }) => (at.saturating_sub(now).saturating_add(500) / 1000) as i64,
            };
            Ok(Reply::Integer(ttl))
        }
        Command::Rename { from, to } => {
            let entry = data
                .remove(&from)
                .ok_or_else(|| StoreError::NoSuchKey(from.clone()))?;
            data.insert(to, entry);
            Ok(Reply::Ok)
        }
        Command::Keys { pattern } => {
            let mut keys: Vec<String> = data
                .keys()
                .filter(|k| glob_match(&pattern, k))
                .cloned()
                .collect();
            keys.sort();
            Ok(Reply::Values(keys))
        }
        Command::SAdd { key, member } => Ok(flag(set_mut(data, &key)?.insert(member))),
        Command::SRem { key, member } => {
            let removed = if set_ref(data, &key)?.is_some() {
                set_mut(data, &key)?.remove(&member)
            } else {
                false
            };
            drop_if_empty(data, &key);
            Ok(flag(removed))
        }
        Command::SIsMember { key, member } => Ok(flag(
            set_ref(data, &key)?.is_some_and(|set| set.contains(&member)),
        )),
        Command::SMembers { key } => Ok(Reply::Values(
            set_ref(data, &key)?
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default(),
        )),
        Command::SCard { key } => Ok(Reply::Integer(
            set_ref(data, &key)?.map_or(0, |set| set.len() as i64),
        )),
        Command::HSet { key, fields } => {
            if fields.is_empty() {
                hash_ref(data, &key)?;
                return Ok(Reply::Integer(0));
            }
            let hash = hash_mut(data, &key)?;
            let mut created = 0;
            for (field, value) in fields {
                if hash.insert(field, value).is_none() {
                    created += 1;
                }
            }
            Ok(Reply::Integer(created))
        }
        Command::HDel { key, field } => {
            let removed = if hash_ref(data, &key)?.is_some() {
                hash_mut(data, &key)?.remove(&field).is_some()
            } else {
                false
            };
            drop_if_empty(data, &key);
            Ok(flag(removed))
        }
        Command::HGet { key, field } => Ok(hash_ref(data, &key)?
            .and_then(|hash| hash.get(&field).cloned())
            .map_or(Reply::Nil, Reply::Value)),
        Command::HGetAll { key } => Ok(Reply::Fields(
            hash_ref(data, &key)?
                .map(|hash| {
                    hash.iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                })
                .unwrap_or_default(),
        )),
        Command::HIncrBy { key, field, delta } => {
            let current = match hash_ref(data, &key)?.and_then(|hash| hash.get(&field)) {
                None => 0,
                Some(raw) => parse_integer(&key, raw)?,
            };
            let next = current
                .checked_add(delta)
                .ok_or_else(|| StoreError::NotAnInteger { key: key.clone() })?;
            hash_mut(data, &key)?.insert(field, next.to_string());
            Ok(Reply::Integer(next))
        }
    }
}

/// Match `text` against a glob pattern supporting `*` and `?`.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Batch, Ttl};

    fn store_at(start: u64) -> (MemoryStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        (MemoryStore::with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("cart:1:index:*", "cart:1:index:Bottle:17"));
        assert!(!glob_match("cart:1:index:*", "cart:1:index"));
        assert!(!glob_match("cart:1:index:*", "cart:12:index:Bottle:17"));
        assert!(glob_match("item:?", "item:7"));
        assert!(glob_match("*", ""));
        assert!(glob_match("a*b*c", "aXXbYYc"));
        assert!(!glob_match("a*b*c", "aXXbYY"));
    }

    #[test]
    fn test_incr_allocates_sequentially() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("item:id").unwrap(), 1);
        assert_eq!(store.incr("item:id").unwrap(), 2);
        assert_eq!(store.get("item:id").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_incr_rejects_non_integer() {
        let store = MemoryStore::new();
        store.set("counter", "abc").unwrap();
        assert!(matches!(
            store.incr("counter"),
            Err(StoreError::NotAnInteger { .. })
        ));
    }

    #[test]
    fn test_wrong_type() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert!(matches!(
            store.sadd("k", "m"),
            Err(StoreError::WrongType { .. })
        ));
        assert!(matches!(
            store.hget("k", "f"),
            Err(StoreError::WrongType { .. })
        ));
    }

    #[test]
    fn test_empty_set_ceases_to_exist() {
        let store = MemoryStore::new();
        store.sadd("s", "a").unwrap();
        assert!(store.exists("s").unwrap());
        assert!(store.srem("s", "a").unwrap());
        assert!(!store.exists("s").unwrap());
        assert_eq!(store.scard("s").unwrap(), 0);
        assert!(store.smembers("s").unwrap().is_empty());
    }

    #[test]
    fn test_hash_fields() {
        let store = MemoryStore::new();
        let created = store
            .hset(
                "h",
                vec![("a".into(), "1".into()), ("b".into(), "2".into())],
            )
            .unwrap();
        assert_eq!(created, 2);
        assert_eq!(store.hincrby("h", "a", 4).unwrap(), 5);
        assert_eq!(store.hincrby("h", "c", 1).unwrap(), 1);
        assert!(store.hdel("h", "b").unwrap());
        assert_eq!(
            store.hgetall("h").unwrap(),
            vec![("a".to_string(), "5".to_string()), ("c".to_string(), "1".to_string())]
        );
        assert!(store.hgetall("missing").unwrap().is_empty());
    }

    #[test]
    fn test_expiry_follows_clock() {
        let (store, clock) = store_at(1_000);
        store.set("k", "v").unwrap();
        assert_eq!(store.ttl("k").unwrap(), Ttl::Persistent);
        assert!(store.expire("k", 10).unwrap());
        assert_eq!(store.ttl("k").unwrap(), Ttl::Seconds(10));

        clock.advance(Duration::from_millis(4_400));
        assert_eq!(store.ttl("k").unwrap(), Ttl::Seconds(6));

        clock.advance(Duration::from_secs(6));
        assert!(!store.exists("k").unwrap());
        assert_eq!(store.ttl("k").unwrap(), Ttl::Missing);
        assert!(!store.expire("k", 10).unwrap());
    }

    #[test]
    fn test_set_clears_expiry() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        store.expire("k", 10).unwrap();
        store.set("k", "w").unwrap();
        assert_eq!(store.ttl("k").unwrap(), Ttl::Persistent);
    }

    #[test]
    fn test_rename_moves_value_and_expiry() {
        let store = MemoryStore::new();
        store.sadd("old", "1").unwrap();
        store.expire("old", 30).unwrap();
        store.set("new", "clobbered").unwrap();

        store.rename("old", "new").unwrap();
        assert!(!store.exists("old").unwrap());
        assert!(store.sismember("new", "1").unwrap());
        assert_eq!(store.ttl("new").unwrap(), Ttl::Seconds(30));

        assert_eq!(
            store.rename("old", "other"),
            Err(StoreError::NoSuchKey("old".to_string()))
        );
    }

    #[test]
    fn test_failed_batch_leaves_no_partial_state() {
        let store = MemoryStore::new();
        store.set("str", "v").unwrap();

        let mut batch = Batch::new();
        batch
            .sadd("cart:1", "1")
            .set("cart:1:index:Bottle:17", "1")
            .sadd("str", "boom");
        assert!(store.exec(batch).is_err());

        assert!(!store.exists("cart:1").unwrap());
        assert!(!store.exists("cart:1:index:Bottle:17").unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_failed_batch_restores_overwritten_and_renamed_keys() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.sadd("old", "x").unwrap();
        store.expire("old", 30).unwrap();
        store.set("bystander", "keep").unwrap();

        let mut batch = Batch::new();
        batch
            .set("a", "2")
            .del("bystander")
            .rename("old", "new")
            .hincrby("a", "f", 1);
        assert_eq!(
            store.exec(batch),
            Err(StoreError::WrongType {
                key: "a".to_string()
            })
        );

        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("bystander").unwrap().as_deref(), Some("keep"));
        assert!(store.sismember("old", "x").unwrap());
        assert_eq!(store.ttl("old").unwrap(), Ttl::Seconds(30));
        assert!(!store.exists("new").unwrap());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_expired_keys_are_invisible_to_batches() {
        let (store, clock) = store_at(0);
        store.sadd("cart:1", "1").unwrap();
        store.expire("cart:1", 5).unwrap();
        store.set("cart:1:index:Bottle:17", "1").unwrap();
        store.expire("cart:1:index:Bottle:17", 5).unwrap();
        clock.advance(Duration::from_secs(5));

        let mut batch = Batch::new();
        batch.sadd("cart:1", "2").expire("cart:1:index:Bottle:17", 60);
        let replies = store.exec(batch).unwrap();
        assert_eq!(replies, vec![Reply::Integer(1), Reply::Integer(0)]);
        assert_eq!(store.smembers("cart:1").unwrap(), vec!["2".to_string()]);
        assert!(store.keys("cart:1:index:*").unwrap().is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_batch_replies_in_order() {
        let store = MemoryStore::new();
        let mut batch = Batch::new();
        batch.sadd("s", "a").sadd("s", "a").expire("s", 5);
        let replies = store.exec(batch).unwrap();
        assert_eq!(
            replies,
            vec![Reply::Integer(1), Reply::Integer(0), Reply::Integer(1)]
        );
        assert!(store.exec(Batch::new()).unwrap().is_empty());
    }

    #[test]
    fn test_keys_sorted_and_filtered() {
        let store = MemoryStore::new();
        store.set("cart:1:index:B:2", "2").unwrap();
        store.set("cart:1:index:A:1", "1").unwrap();
        store.sadd("cart:1:index", "A:1").unwrap();
        assert_eq!(
            store.keys("cart:1:index:*").unwrap(),
            vec!["cart:1:index:A:1".to_string(), "cart:1:index:B:2".to_string()]
        );
    }

    #[test]
    fn test_expire_zero_deletes() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert!(store.expire("k", 0).unwrap());
        assert!(!store.exists("k").unwrap());
    }

    #[test]
    fn test_shared_through_arc() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let other = store.clone();
        store.incr("n").unwrap();
        assert_eq!(other.incr("n").unwrap(), 2);
    }
}
