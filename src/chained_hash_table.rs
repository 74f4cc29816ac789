//! ChainedHashTable: integer-keyed separate chaining with growth driven by
//! the longest observed chain.

use crate::config::TableConfig;
use crate::error::{Result, TableError};
use crate::pair::Pair;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Arena key of one chain entry.
    pub(crate) struct EntryKey;
}

// SlotMap refuses to grow past this many live elements.
const MAX_ENTRIES: usize = (u32::MAX - 1) as usize;

#[derive(Clone, Debug)]
pub(crate) struct Entry<V> {
    pub(crate) key: i64,
    value: V,
    next: Option<EntryKey>,
}

/// Bucket index of a non-negative key under a table of `size` buckets.
#[inline]
fn bucket_index(key: i64, size: usize) -> usize {
    debug_assert!(key >= 0);
    (key as u64 % size as u64) as usize
}

fn check_key(key: i64) -> Result<()> {
    if key < 0 {
        return Err(TableError::invalid_argument(format!(
            "negative key {key} is not accepted"
        )));
    }
    Ok(())
}

fn alloc_buckets(size: usize) -> Result<Vec<Option<EntryKey>>> {
    let mut buckets = Vec::new();
    buckets
        .try_reserve_exact(size)
        .map_err(|_| TableError::allocation_failure(size))?;
    buckets.resize(size, None);
    Ok(buckets)
}

/// Walks one chain from its head.
pub(crate) struct Chain<'a, V> {
    entries: &'a SlotMap<EntryKey, Entry<V>>,
    cur: Option<EntryKey>,
}

impl<'a, V> Iterator for Chain<'a, V> {
    type Item = (EntryKey, &'a Entry<V>);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let e = self.entries.get(k)?;
        self.cur = e.next;
        Some((k, e))
    }
}

/// Hash table from non-negative `i64` keys to `V`.
///
/// Entries are stored in an arena; each bucket holds the head of a singly
/// linked chain threaded through the arena. New entries become the chain
/// head. After an insert leaves some chain longer than
/// `TableConfig::max_chain_len`, the bucket array grows by
/// `TableConfig::resize_factor` and all entries are relinked. The table
/// never shrinks.
///
/// Negative keys are rejected by `insert` and `remove` with
/// `TableError::InvalidArgument`, and are never found by lookups.
#[derive(Clone, Debug)]
pub struct ChainedHashTable<V> {
    config: TableConfig,
    buckets: Vec<Option<EntryKey>>,
    entries: SlotMap<EntryKey, Entry<V>>,
    // Upper bound on the longest chain since the last resize or flush.
    max_chain_len: usize,
}

impl<V> ChainedHashTable<V> {
    pub fn new() -> Self {
        let config = TableConfig::default();
        Self {
            buckets: vec![None; config.start_size()],
            entries: SlotMap::with_key(),
            max_chain_len: 0,
            config,
        }
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            buckets: alloc_buckets(config.start_size())?,
            entries: SlotMap::with_key(),
            max_chain_len: 0,
            config,
        })
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Longest chain observed since the last resize or flush.
    pub fn max_chain_len(&self) -> usize {
        self.max_chain_len
    }

    pub(crate) fn chain(&self, idx: usize) -> Chain<'_, V> {
        Chain {
            entries: &self.entries,
            cur: self.buckets[idx],
        }
    }

    fn lookup(&self, key: i64) -> Option<EntryKey> {
        if key < 0 {
            return None;
        }
        let idx = bucket_index(key, self.buckets.len());
        self.chain(idx).find(|(_, e)| e.key == key).map(|(k, _)| k)
    }

    /// Returns whether `key` is stored. Only the key's own bucket is scanned.
    pub fn find(&self, key: i64) -> bool {
        self.lookup(key).is_some()
    }

    pub fn get(&self, key: i64) -> Option<&V> {
        let k = self.lookup(key)?;
        self.entries.get(k).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: i64) -> Option<&mut V> {
        let k = self.lookup(key)?;
        self.entries.get_mut(k).map(|e| &mut e.value)
    }

    /// Insert `key -> value` at the head of its chain.
    ///
    /// Fails with `AlreadyPresent` if the key is stored, `InvalidArgument`
    /// for a negative key, and `AllocationFailure` if the entry or a
    /// triggered resize cannot be allocated. A resize target is allocated
    /// before anything is linked, so every failure leaves the table as it
    /// was.
    pub fn insert(&mut self, key: i64, value: V) -> Result<()> {
        check_key(key)?;
        let idx = bucket_index(key, self.buckets.len());

        let mut chain_len = 0;
        for (_, e) in self.chain(idx) {
            if e.key == key {
                return Err(TableError::AlreadyPresent { key });
            }
            chain_len += 1;
        }
        if self.entries.len() >= MAX_ENTRIES {
            return Err(TableError::allocation_failure(self.entries.len() + 1));
        }

        let observed = self.max_chain_len.max(chain_len + 1);
        let grown = if observed > self.config.max_chain_len() {
            Some(self.grow()?)
        } else {
            None
        };

        let head = self.buckets[idx];
        let k = self.entries.insert(Entry {
            key,
            value,
            next: head,
        });
        self.buckets[idx] = Some(k);
        self.max_chain_len = observed;

        if let Some(buckets) = grown {
            self.relink(buckets);
        }
        Ok(())
    }

    /// Allocate an empty bucket array for the next table size.
    fn grow(&self) -> Result<Vec<Option<EntryKey>>> {
        let next = self
            .buckets
            .len()
            .checked_mul(self.config.resize_factor())
            .ok_or_else(|| TableError::allocation_failure(usize::MAX))?;
        alloc_buckets(next)
    }

    /// Swap in `buckets` and move every entry to its bucket under the new
    /// modulus. Never resizes again, even if a relinked chain is still long.
    fn relink(&mut self, buckets: Vec<Option<EntryKey>>) {
        let old = std::mem::replace(&mut self.buckets, buckets);
        let size = self.buckets.len();
        log::debug!(
            "resizing chained hash table: {} -> {} buckets ({} entries, longest chain {})",
            old.len(),
            size,
            self.entries.len(),
            self.max_chain_len
        );

        for head in old {
            let mut cur = head;
            while let Some(k) = cur {
                let Some(entry) = self.entries.get_mut(k) else {
                    break;
                };
                cur = entry.next;
                let idx = bucket_index(entry.key, size);
                entry.next = self.buckets[idx];
                self.buckets[idx] = Some(k);
            }
        }

        self.max_chain_len = (0..size)
            .map(|idx| self.chain(idx).count())
            .max()
            .unwrap_or(0);
    }

    /// Remove `key` and return its value. Never shrinks the table.
    pub fn remove(&mut self, key: i64) -> Result<V> {
        check_key(key)?;
        let idx = bucket_index(key, self.buckets.len());

        let mut prev: Option<EntryKey> = None;
        let mut cur = self.buckets[idx];
        while let Some(k) = cur {
            let Some(entry) = self.entries.get(k) else {
                break;
            };
            if entry.key == key {
                let next = entry.next;
                match prev {
                    None => self.buckets[idx] = next,
                    Some(p) => {
                        if let Some(pe) = self.entries.get_mut(p) {
                            pe.next = next;
                        }
                    }
                }
                return self
                    .entries
                    .remove(k)
                    .map(|e| e.value)
                    .ok_or(TableError::KeyNotFound { key });
            }
            prev = Some(k);
            cur = entry.next;
        }
        Err(TableError::KeyNotFound { key })
    }

    /// Move every stored pair out of the table, in no particular order.
    ///
    /// The table is left empty with its bucket count unchanged. If the
    /// output cannot be allocated the table is not touched.
    pub fn flush_all(&mut self) -> Result<Vec<Pair<i64, V>>> {
        let count = self.entries.len();
        let mut out = Vec::new();
        out.try_reserve_exact(count)
            .map_err(|_| TableError::allocation_failure(count))?;

        out.extend(
            self.entries
                .drain()
                .map(|(_, e)| Pair::new(e.key, e.value)),
        );
        self.buckets.fill(None);
        self.max_chain_len = 0;
        log::trace!(
            "flushed {} entries from chained hash table ({} buckets)",
            out.len(),
            self.buckets.len()
        );
        Ok(out)
    }
}

impl<V> Default for ChainedHashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn small<V>(start: usize, max_chain: usize) -> ChainedHashTable<V> {
        ChainedHashTable::with_config(
            TableConfig::new()
                .with_start_size(start)
                .with_max_chain_len(max_chain),
        )
        .unwrap()
    }

    /// Invariant: The table starts empty with the default bucket count.
    #[test]
    fn new_table_is_empty() {
        let t: ChainedHashTable<String> = ChainedHashTable::new();
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        assert_eq!(t.capacity(), TableConfig::DEFAULT_START_SIZE);
        assert_eq!(t.max_chain_len(), 0);
        assert!(!t.find(0));
    }

    /// Invariant: Duplicate keys are rejected and the stored value is kept.
    #[test]
    fn duplicate_insert_rejected() {
        let mut t = ChainedHashTable::new();
        t.insert(5, "first").unwrap();
        match t.insert(5, "second") {
            Err(TableError::AlreadyPresent { key: 5 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(t.get(5), Some(&"first"));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: Keys sharing a bucket coexist; removal of one leaves the other.
    #[test]
    fn colliding_keys_coexist() {
        let mut t = ChainedHashTable::new();
        t.insert(1, "a").unwrap();
        t.insert(129, "b").unwrap();
        assert_eq!(t.max_chain_len(), 2);
        assert!(t.find(1));
        assert!(t.find(129));

        assert_eq!(t.remove(1), Ok("a"));
        assert!(!t.find(1));
        assert!(t.find(129));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: Removal works at the head, middle and tail of a chain.
    #[test]
    fn remove_from_every_chain_position() {
        let mut t = small(4, 100);
        // All in bucket 0; chain order is 12, 8, 4, 0 (newest first).
        for k in [0, 4, 8, 12] {
            t.insert(k, k as i32).unwrap();
        }
        assert_eq!(t.remove(8), Ok(8)); // middle
        assert_eq!(t.remove(0), Ok(0)); // tail
        assert_eq!(t.remove(12), Ok(12)); // head
        assert!(t.find(4));
        assert_eq!(t.len(), 1);
        assert_eq!(t.remove(4), Ok(4));
        assert!(t.is_empty());
    }

    /// Invariant: Removing an absent key fails without changing the table.
    #[test]
    fn remove_missing_key() {
        let mut t = small(4, 100);
        t.insert(4, 1).unwrap();
        assert_eq!(t.remove(8), Err(TableError::KeyNotFound { key: 8 }));
        assert_eq!(t.remove(1), Err(TableError::KeyNotFound { key: 1 }));
        assert_eq!(t.len(), 1);
        assert!(t.find(4));
    }

    /// Invariant: Negative keys are rejected on insert/remove and never found.
    #[test]
    fn negative_keys_rejected() {
        let mut t = ChainedHashTable::new();
        assert!(matches!(
            t.insert(-1, 0),
            Err(TableError::InvalidArgument { .. })
        ));
        assert!(matches!(
            t.remove(-1),
            Err(TableError::InvalidArgument { .. })
        ));
        assert!(!t.find(-1));
        assert!(t.get(-1).is_none());
        assert!(t.is_empty());
    }

    /// Invariant: A chain longer than the threshold doubles the bucket array and
    /// every entry stays reachable under the new modulus.
    #[test]
    fn long_chain_triggers_resize() {
        let mut t = small(8, 3);
        for k in [0, 8, 16] {
            t.insert(k, k as i32).unwrap();
        }
        assert_eq!(t.capacity(), 8);
        assert_eq!(t.max_chain_len(), 3);

        t.insert(24, 24).unwrap();
        assert_eq!(t.capacity(), 16);
        // Under mod 16: {0, 16} and {8, 24}.
        assert_eq!(t.max_chain_len(), 2);
        for k in [0, 8, 16, 24] {
            assert_eq!(t.get(k), Some(&(k as i32)));
        }
        assert_eq!(t.len(), 4);
    }

    /// Invariant: Relinking never triggers a nested resize even when a chain
    /// stays long; the next insert grows again.
    #[test]
    fn resize_is_not_recursive() {
        let mut t: ChainedHashTable<i32> = small(2, 2);
        // Multiples of 8 collide under both 2 and 4 buckets.
        for k in [0, 8, 16] {
            t.insert(k, 0).unwrap();
        }
        assert_eq!(t.capacity(), 4);
        assert_eq!(t.max_chain_len(), 3);

        t.insert(1, 0).unwrap();
        assert_eq!(t.capacity(), 8);
        for k in [0, 8, 16, 1] {
            assert!(t.find(k));
        }
    }

    /// Invariant: A failed resize allocation leaves the table untouched.
    #[test]
    fn failed_resize_is_all_or_nothing() {
        let mut t: ChainedHashTable<i32> = ChainedHashTable::with_config(
            TableConfig::new()
                .with_start_size(1)
                .with_resize_factor(usize::MAX)
                .with_max_chain_len(1),
        )
        .unwrap();
        t.insert(0, 0).unwrap();
        match t.insert(1, 1) {
            Err(TableError::AllocationFailure { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(t.len(), 1);
        assert_eq!(t.capacity(), 1);
        assert!(!t.find(1));
        assert!(t.find(0));
        assert_eq!(t.max_chain_len(), 1);
    }

    /// Invariant: An unallocatable start size is reported, not aborted on.
    #[test]
    fn oversized_start_reports_allocation_failure() {
        let r: Result<ChainedHashTable<u8>> =
            ChainedHashTable::with_config(TableConfig::new().with_start_size(usize::MAX));
        assert!(matches!(r, Err(TableError::AllocationFailure { .. })));
    }

    /// Invariant: Flush exports each pair once, empties the table and keeps capacity.
    #[test]
    fn flush_exports_and_empties() {
        let mut t = small(4, 2);
        for k in 0..20 {
            t.insert(k, (k * 10) as i32).unwrap();
        }
        let cap = t.capacity();
        assert!(cap > 4);

        let out: BTreeMap<i64, i32> = t
            .flush_all()
            .unwrap()
            .into_iter()
            .map(Pair::into_parts)
            .collect();
        assert_eq!(out.len(), 20);
        for k in 0..20 {
            assert_eq!(out.get(&k), Some(&((k * 10) as i32)));
            assert!(!t.find(k));
        }
        assert!(t.is_empty());
        assert_eq!(t.capacity(), cap);
        assert_eq!(t.max_chain_len(), 0);

        // Still usable afterwards.
        t.insert(3, 3).unwrap();
        assert_eq!(t.get(3), Some(&3));
        assert!(t.flush_all().unwrap().len() == 1);
        assert!(t.flush_all().unwrap().is_empty());
    }

    /// Invariant: `get_mut` updates are seen by later lookups and by flush.
    #[test]
    fn get_mut_updates_value() {
        let mut t = ChainedHashTable::new();
        t.insert(42, 1).unwrap();
        *t.get_mut(42).unwrap() += 5;
        assert_eq!(t.get(42), Some(&6));
        assert!(t.get_mut(43).is_none());
        let out = t.flush_all().unwrap();
        assert_eq!(out, vec![Pair::new(42, 6)]);
    }

    /// Invariant: Values are dropped exactly once across remove, flush and drop.
    #[test]
    fn values_dropped_once() {
        use std::rc::Rc;
        let probe = Rc::new(());
        let mut t = small(2, 2);
        for k in 0..16 {
            t.insert(k, Rc::clone(&probe)).unwrap();
        }
        assert_eq!(Rc::strong_count(&probe), 17);
        drop(t.remove(3).unwrap());
        assert_eq!(Rc::strong_count(&probe), 16);
        let out = t.flush_all().unwrap();
        assert_eq!(Rc::strong_count(&probe), 16);
        drop(out);
        assert_eq!(Rc::strong_count(&probe), 1);
        for k in 0..4 {
            t.insert(k, Rc::clone(&probe)).unwrap();
        }
        drop(t);
        assert_eq!(Rc::strong_count(&probe), 1);
    }
}
