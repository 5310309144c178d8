//! `Table`: an ordered collection of (key, value) entries.
//!
//! Backed by a plain `Vec<(Value, Value)>` for insertion order plus an
//! `ahash` index map from a hashable `ValueKey` projection to the entry's
//! slot, keyed by bit pattern for numbers and pointer identity for the
//! reference-counted variants. No array/hash split: every key goes through
//! the same index.

use ahash::AHashMap;
use std::rc::Rc;

use super::value::Value;

#[derive(Default)]
pub struct Table {
    entries: Vec<(Value, Value)>,
    /// Maps a hashable projection of a key to its slot in `entries`, for
    /// O(1) `get`/`set`/`has`. `None` once an entry has been removed (this
    /// spec never removes, only overwrites), so the invariant is simply
    /// "at most one live index per key".
    index: AHashMap<ValueKey, usize>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// Appends `(key, value)` without deduplication — the constructor
    /// primitive. If the key already has an entry, that earlier entry is
    /// left in place and a second one is appended; `index` is updated to
    /// point at the newest one, so `get` always returns the most recently
    /// inserted value for a duplicated key.
    pub fn insert(&mut self, key: Value, value: Value) {
        let slot = self.entries.len();
        if let Some(hkey) = ValueKey::new(&key) {
            self.index.insert(hkey, slot);
        }
        self.entries.push((key, value));
    }

    /// Inserts or overwrites so at most one entry per key survives.
    pub fn set(&mut self, key: Value, value: Value) {
        if let Some(hkey) = ValueKey::new(&key) {
            if let Some(&slot) = self.index.get(&hkey) {
                self.entries[slot].1 = value;
                return;
            }
        }
        self.insert(key, value);
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        let hkey = ValueKey::new(key)?;
        let &slot = self.index.get(&hkey)?;
        Some(&self.entries[slot].1)
    }

    pub fn has(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The Lua `#t` border: the length of the maximal run of contiguous
    /// positive-integer keys `1, 2, 3, ...` with non-nil values.
    pub fn border_length(&self) -> u64 {
        let mut n = 1u64;
        loop {
            match self.get(&Value::Number(n as f64)) {
                Some(v) if !v.is_nil() => n += 1,
                _ => return n - 1,
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }
}

/// A hashable, structurally-equal-to-`Value` key. Mirrors `Value`'s own
/// `PartialEq`: numbers compare by bit pattern like `hash_lua_value`
/// does, references by pointer identity. `Nil` keys are not
/// representable (inserting under a nil key is a no-op key-wise, matching
/// real Lua where `t[nil] = v` is invalid).
#[derive(Clone, PartialEq, Eq, Hash)]
enum ValueKey {
    Boolean(bool),
    Number(u64),
    String(Rc<str>),
    Address(i64),
    Index(u64),
    Ptr(usize),
}

impl ValueKey {
    fn new(value: &Value) -> Option<ValueKey> {
        Some(match value {
            Value::Nil => return None,
            Value::Boolean(b) => ValueKey::Boolean(*b),
            Value::Number(n) => ValueKey::Number(n.to_bits()),
            Value::String(s) => ValueKey::String(Rc::clone(s)),
            Value::Address(a) => ValueKey::Address(*a),
            Value::Index(i) => ValueKey::Index(*i),
            Value::Table(t) => ValueKey::Ptr(Rc::as_ptr(t) as usize),
            Value::Closure(c) => ValueKey::Ptr(Rc::as_ptr(c) as usize),
            Value::ValuePointer(p) => ValueKey::Ptr(Rc::as_ptr(p) as usize),
        })
    }
}
