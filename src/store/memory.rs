use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;

use super::record::Record;
use crate::clock::vector::ClockError;

/// In-memory key table, exclusively owned by the hosting node's process.
///
/// The concurrent map serializes access per key, which is all the write
/// paths need: every mutation replaces the whole record.
pub struct KeyStore {
    records: DashMap<String, Record>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Record> {
        self.records.get(key).map(|entry| entry.value().clone())
    }

    /// Inserts or replaces a record, returning whether a record was replaced.
    pub fn put(&self, key: String, record: Record) -> bool {
        self.records.insert(key, record).is_some()
    }

    /// Rewrites an existing record in place: the stored clock is bumped at
    /// `position` and the value swapped, all under the entry lock so
    /// concurrent writers to one key serialize. `None` when the key is
    /// absent.
    pub fn overwrite(
        &self,
        key: &str,
        value: &str,
        position: usize,
    ) -> Option<Result<Record, ClockError>> {
        match self.records.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let clock = match entry.get().clock.increment(position) {
                    Ok(clock) => clock,
                    Err(e) => return Some(Err(e)),
                };
                let record = Record::new(value.to_string(), clock);
                entry.insert(record.clone());
                Some(Ok(record))
            }
            Entry::Vacant(_) => None,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Removes a key, returning whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.records.remove(key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.records.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy of the full table, the body of an anti-entropy push.
    pub fn snapshot(&self) -> HashMap<String, Record> {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Merges one incoming record: adopt outright when the key is absent,
    /// otherwise resolve by clock dominance with a last-writer-wins tiebreak.
    /// Returns `true` when the incoming record was adopted.
    pub fn merge(&self, key: String, incoming: Record) -> bool {
        match self.records.entry(key) {
            Entry::Occupied(mut entry) => {
                if entry.get().superseded_by(&incoming) {
                    entry.insert(incoming);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(incoming);
                true
            }
        }
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}
