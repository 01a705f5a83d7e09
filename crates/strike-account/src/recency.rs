//! Capacity-bounded recency sets.
//!
//! A [`RecencySet`] remembers which keys have been seen and when, holding at
//! most `capacity` entries no matter how many distinct keys an attacker feeds
//! it. Entries never expire by age; they only leave when a new key arrives at
//! a full set and the least-recently-seen entry is evicted.
//!
//! # Design
//!
//! Two structures are kept in lockstep:
//! - a `HashMap<K, Timestamp>` answering `contains` / `last_seen` in O(1);
//! - a `BTreeSet<(Timestamp, K)>` ordered by age, so the eviction victim is
//!   `pop_first` in O(log n).
//!
//! Ties on `last_seen` are broken by key order, which keeps eviction
//! deterministic.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use strike_core::error::{ConfigError, RecencyKind, SnapshotError};
use strike_core::types::{RecencyEntry, Timestamp};
use tracing::debug;

/// Bounded mapping from key to last-seen time with least-recently-seen eviction.
#[derive(Debug, Clone)]
pub struct RecencySet<K> {
    kind: RecencyKind,
    capacity: usize,
    last_seen: HashMap<K, Timestamp>,
    by_age: BTreeSet<(Timestamp, K)>,
}

impl<K: Eq + Hash + Ord> PartialEq for RecencySet<K> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.capacity == other.capacity
            && self.last_seen == other.last_seen
            && self.by_age == other.by_age
    }
}

impl<K> RecencySet<K>
where
    K: Eq + Hash + Ord + Clone,
{
    /// Create an empty set holding at most `capacity` keys.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroCapacity`] if `capacity` is zero.
    pub fn new(kind: RecencyKind, capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity(kind));
        }
        Ok(Self {
            kind,
            capacity,
            last_seen: HashMap::with_capacity(capacity),
            by_age: BTreeSet::new(),
        })
    }

    /// Rebuild a set from persisted entries.
    ///
    /// Duplicate keys are merged keeping the latest timestamp.
    ///
    /// # Errors
    ///
    /// - [`SnapshotError::Config`] if `capacity` is zero
    /// - [`SnapshotError::RecencyOverflow`] if there are more distinct keys than `capacity`
    pub fn from_entries<I>(kind: RecencyKind, capacity: usize, entries: I) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = RecencyEntry<K>>,
    {
        let mut set = Self::new(kind, capacity)?;
        let entries: Vec<RecencyEntry<K>> = entries.into_iter().collect();

        let distinct = entries.iter().map(|e| &e.key).collect::<HashSet<_>>().len();
        if distinct > capacity {
            return Err(SnapshotError::RecencyOverflow {
                kind,
                len: distinct,
                capacity,
            });
        }

        for entry in entries {
            set.touch(entry.key, entry.last_seen);
        }
        Ok(set)
    }

    /// Which account set this is, for logs and errors.
    pub fn kind(&self) -> RecencyKind {
        self.kind
    }

    /// Maximum number of keys held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }

    /// Returns `true` if `key` is present, regardless of how long ago it was seen.
    pub fn contains(&self, key: &K) -> bool {
        self.last_seen.contains_key(key)
    }

    /// When `key` was last seen, or `None` if absent.
    pub fn last_seen(&self, key: &K) -> Option<Timestamp> {
        self.last_seen.get(key).copied()
    }

    /// Record that `key` was seen at `when`.
    ///
    /// A present key is refreshed to `max(existing, when)`, so a stale report
    /// never moves its time backwards. An absent key is inserted, evicting the
    /// least-recently-seen entry first if the set is full.
    ///
    /// Returns `true` if the key was newly inserted, `false` if it was already
    /// present.
    pub fn touch(&mut self, key: K, when: Timestamp) -> bool {
        if let Some(seen) = self.last_seen.get_mut(&key) {
            if when > *seen {
                self.by_age.remove(&(*seen, key.clone()));
                *seen = when;
                self.by_age.insert((when, key));
            }
            return false;
        }

        if self.last_seen.len() >= self.capacity {
            self.evict_oldest();
        }
        self.by_age.insert((when, key.clone()));
        self.last_seen.insert(key, when);

        debug_assert_eq!(self.by_age.len(), self.last_seen.len());
        debug_assert!(self.last_seen.len() <= self.capacity);
        true
    }

    /// The least-recently-seen entry.
    pub fn oldest(&self) -> Option<(&K, Timestamp)> {
        self.by_age.first().map(|(t, k)| (k, *t))
    }

    /// The most-recently-seen entry.
    pub fn newest(&self) -> Option<(&K, Timestamp)> {
        self.by_age.last().map(|(t, k)| (k, *t))
    }

    /// Iterate entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (&K, Timestamp)> + '_ {
        self.by_age.iter().map(|(t, k)| (k, *t))
    }

    /// Owned entries from oldest to newest, for snapshots.
    pub fn entries(&self) -> Vec<RecencyEntry<K>> {
        self.by_age
            .iter()
            .map(|(t, k)| RecencyEntry::new(k.clone(), *t))
            .collect()
    }

    fn evict_oldest(&mut self) {
        if let Some((seen, key)) = self.by_age.pop_first() {
            self.last_seen.remove(&key);
            debug!(
                set = %self.kind,
                evicted_last_seen = %seen,
                capacity = self.capacity,
                "recency: evicted least-recently-seen entry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn set(capacity: usize) -> RecencySet<String> {
        RecencySet::new(RecencyKind::SuccessfulDevices, capacity).unwrap()
    }

    fn t(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    fn keys(s: &RecencySet<String>) -> Vec<&str> {
        s.iter().map(|(k, _)| k.as_str()).collect()
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    #[test]
    fn zero_capacity_rejected() {
        let err = RecencySet::<String>::new(RecencyKind::IncorrectPasswords, 0).unwrap_err();
        assert_eq!(err, ConfigError::ZeroCapacity(RecencyKind::IncorrectPasswords));
    }

    #[test]
    fn new_set_is_empty() {
        let s = set(3);
        assert!(s.is_empty());
        assert_eq!(s.capacity(), 3);
        assert_eq!(s.oldest(), None);
        assert!(!s.contains(&"a".to_string()));
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let mut a = set(3);
        a.touch("x".to_string(), t(1));
        a.touch("y".to_string(), t(2));
        let mut b = set(3);
        b.touch("y".to_string(), t(2));
        b.touch("x".to_string(), t(1));
        assert_eq!(a, b);

        b.touch("x".to_string(), t(5));
        assert_ne!(a, b);
        assert_ne!(a, set(4));
    }

    // -------------------------------------------------------------------------
    // touch
    // -------------------------------------------------------------------------

    #[test]
    fn touch_reports_new_then_existing() {
        let mut s = set(3);
        assert!(s.touch("a".into(), t(1)));
        assert!(!s.touch("a".into(), t(2)));
        assert_eq!(s.len(), 1);
        assert_eq!(s.last_seen(&"a".into()), Some(t(2)));
    }

    #[test]
    fn touch_is_idempotent() {
        let mut s = set(3);
        s.touch("a".into(), t(5));
        s.touch("b".into(), t(6));
        let before = s.clone();
        s.touch("a".into(), t(5));
        assert_eq!(s, before);
    }

    #[test]
    fn stale_touch_never_regresses() {
        let mut s = set(3);
        s.touch("k".into(), t(10));
        s.touch("k".into(), t(4));
        assert_eq!(s.last_seen(&"k".into()), Some(t(10)));
    }

    #[test]
    fn capacity_two_evicts_oldest() {
        let mut s = set(2);
        s.touch("a".into(), t(1));
        s.touch("b".into(), t(2));
        s.touch("c".into(), t(3));
        assert_eq!(s.len(), 2);
        assert!(!s.contains(&"a".into()));
        assert_eq!(keys(&s), vec!["b", "c"]);
    }

    #[test]
    fn eviction_follows_recency_not_insertion() {
        let mut s = set(2);
        s.touch("a".into(), t(1));
        s.touch("b".into(), t(2));
        // Refresh "a" so "b" becomes the least recently seen.
        s.touch("a".into(), t(3));
        s.touch("c".into(), t(4));
        assert_eq!(keys(&s), vec!["a", "c"]);
    }

    #[test]
    fn evicted_key_is_new_again() {
        let mut s = set(1);
        assert!(s.touch("a".into(), t(1)));
        assert!(s.touch("b".into(), t(2)));
        assert!(s.touch("a".into(), t(3)), "evicted key counts as newly inserted");
        assert_eq!(keys(&s), vec!["a"]);
    }

    #[test]
    fn ties_break_by_key_order() {
        let mut s = set(2);
        s.touch("b".into(), t(7));
        s.touch("a".into(), t(7));
        s.touch("c".into(), t(8));
        assert_eq!(keys(&s), vec!["b", "c"]);
    }

    #[test]
    fn out_of_order_insert_is_first_victim() {
        let mut s = set(2);
        s.touch("late".into(), t(100));
        s.touch("early".into(), t(1));
        s.touch("next".into(), t(101));
        assert!(!s.contains(&"early".into()));
        assert!(s.contains(&"late".into()));
    }

    #[test]
    fn oldest_and_newest() {
        let mut s = set(4);
        s.touch("x".into(), t(3));
        s.touch("y".into(), t(1));
        s.touch("z".into(), t(2));
        assert_eq!(s.oldest().map(|(k, at)| (k.as_str(), at)), Some(("y", t(1))));
        assert_eq!(s.newest().map(|(k, at)| (k.as_str(), at)), Some(("x", t(3))));
    }

    // -------------------------------------------------------------------------
    // Snapshots
    // -------------------------------------------------------------------------

    #[test]
    fn entries_round_trip() {
        let mut s = set(3);
        s.touch("a".into(), t(3));
        s.touch("b".into(), t(1));
        let entries = s.entries();
        assert_eq!(entries[0], RecencyEntry::new("b".to_string(), t(1)));

        let rebuilt =
            RecencySet::from_entries(RecencyKind::SuccessfulDevices, 3, entries).unwrap();
        assert_eq!(rebuilt, s);
    }

    #[test]
    fn from_entries_merges_duplicates() {
        let entries = vec![
            RecencyEntry::new("a".to_string(), t(5)),
            RecencyEntry::new("a".to_string(), t(9)),
            RecencyEntry::new("a".to_string(), t(2)),
        ];
        let s = RecencySet::from_entries(RecencyKind::SuccessfulDevices, 1, entries).unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s.last_seen(&"a".into()), Some(t(9)));
    }

    #[test]
    fn from_entries_rejects_overflow() {
        let entries = (0..4).map(|i| RecencyEntry::new(format!("k{i}"), t(i)));
        let err =
            RecencySet::from_entries(RecencyKind::IncorrectPasswords, 3, entries).unwrap_err();
        assert_eq!(
            err,
            SnapshotError::RecencyOverflow {
                kind: RecencyKind::IncorrectPasswords,
                len: 4,
                capacity: 3,
            }
        );
    }

    #[test]
    fn from_entries_rejects_zero_capacity() {
        let err = RecencySet::<String>::from_entries(RecencyKind::SuccessfulDevices, 0, Vec::new())
            .unwrap_err();
        assert!(matches!(err, SnapshotError::Config(ConfigError::ZeroCapacity(_))));
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    /// Naive reference: a vector scanned linearly for the minimum.
    #[derive(Default)]
    struct Model {
        entries: Vec<(u8, u64)>,
    }

    impl Model {
        fn touch(&mut self, key: u8, when: u64, capacity: usize) -> bool {
            if let Some(e) = self.entries.iter_mut().find(|e| e.0 == key) {
                e.1 = e.1.max(when);
                return false;
            }
            if self.entries.len() >= capacity {
                let victim = self
                    .entries
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, e)| (e.1, e.0))
                    .map(|(i, _)| i)
                    .unwrap();
                self.entries.swap_remove(victim);
            }
            self.entries.push((key, when));
            true
        }
    }

    proptest! {
        #[test]
        fn bounded_and_keeps_most_recent(capacity in 1usize..=16, extra in 0usize..=48) {
            let mut s = RecencySet::new(RecencyKind::IncorrectPasswords, capacity).unwrap();
            let total = capacity + extra;
            for i in 0..total {
                s.touch(i as u64, t(i as u64));
                prop_assert!(s.len() <= capacity);
            }
            prop_assert_eq!(s.len(), capacity);
            for i in 0..total {
                prop_assert_eq!(s.contains(&(i as u64)), i >= extra, "key {}", i);
            }
        }

        #[test]
        fn matches_linear_scan_model(
            capacity in 1usize..=6,
            ops in proptest::collection::vec((0u8..12, 0u64..40), 0..80),
        ) {
            let mut s = RecencySet::new(RecencyKind::SuccessfulDevices, capacity).unwrap();
            let mut model = Model::default();
            for (key, when) in ops {
                let inserted = s.touch(key, t(when));
                let expected = model.touch(key, when, capacity);
                prop_assert_eq!(inserted, expected);
            }
            prop_assert_eq!(s.len(), model.entries.len());
            for (key, when) in &model.entries {
                prop_assert_eq!(s.last_seen(key), Some(t(*when)));
            }
        }
    }
}
