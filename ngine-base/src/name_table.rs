use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::hashing::hash_str;

// Must be a power of two, the bucket of a string is its hash masked by BUCKET_COUNT - 1
const BUCKET_COUNT: usize = 4096;
const BUCKET_MASK: u64 = (BUCKET_COUNT - 1) as u64;

// Slot index used for "null" in the bucket lists
const NULL_SLOT: u32 = u32::MAX;

lazy_static::lazy_static! {
    static ref GLOBAL_NAME_TABLE: NameTable = NameTable::new();
}

struct NameTableEntry {
    string: Arc<str>,
    hash: u64,
    // Only modified while holding at least the read lock. Increments happen under the read lock
    // from an already-counted reference, decrements happen under the write lock, so an entry
    // can never be resurrected while it is being unlinked.
    refcount: AtomicU64,
    previous: u32,
    next: u32,
    bucket: u32,
}

struct NameTableInner {
    // Head slot of every bucket's doubly linked list
    buckets: Box<[u32]>,
    // Entries are addressed by slot index so that links never dangle
    slots: Vec<Option<NameTableEntry>>,
    free_slots: Vec<u32>,
    len: usize,
}

impl NameTableInner {
    fn find_slot(
        &self,
        s: &str,
        hash: u64,
    ) -> Option<u32> {
        let mut slot = self.buckets[(hash & BUCKET_MASK) as usize];
        while slot != NULL_SLOT {
            let entry = self.slots[slot as usize]
                .as_ref()
                .expect("bucket list references a free slot");

            // Hash first so the common mismatch is cheap, then the string to survive collisions
            if entry.hash == hash && &*entry.string == s {
                return Some(slot);
            }

            slot = entry.next;
        }

        None
    }

    fn entry_ref(
        &self,
        slot: u32,
    ) -> NameEntryRef {
        let entry = self.slots[slot as usize]
            .as_ref()
            .expect("entry_ref called on a free slot");
        NameEntryRef {
            slot,
            hash: entry.hash,
            string: entry.string.clone(),
        }
    }

    fn allocate_slot(&mut self) -> u32 {
        if let Some(slot) = self.free_slots.pop() {
            slot
        } else {
            let slot = self.slots.len() as u32;
            assert_ne!(slot, NULL_SLOT, "name table is full");
            self.slots.push(None);
            slot
        }
    }

    fn unlink(
        &mut self,
        slot: u32,
    ) -> NameTableEntry {
        let entry = self.slots[slot as usize]
            .take()
            .expect("unlink called on a free slot");

        if entry.previous != NULL_SLOT {
            self.slots[entry.previous as usize].as_mut().unwrap().next = entry.next;
        } else {
            // The entry was the head of its bucket, its next entry becomes the new head
            debug_assert_eq!(self.buckets[entry.bucket as usize], slot);
            self.buckets[entry.bucket as usize] = entry.next;
        }

        if entry.next != NULL_SLOT {
            self.slots[entry.next as usize].as_mut().unwrap().previous = entry.previous;
        }

        self.free_slots.push(slot);
        self.len -= 1;
        entry
    }
}

/// A snapshot of a live entry of a [`NameTable`]. It keeps the string alive but does not hold a
/// reference on the entry. Counted references are [`crate::Name`] values.
#[derive(Clone, Debug)]
pub struct NameEntryRef {
    slot: u32,
    hash: u64,
    string: Arc<str>,
}

impl NameEntryRef {
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn as_str(&self) -> &str {
        &self.string
    }
}

/// Canonical set of reference-counted strings. Equal strings always share a single entry, which
/// lets names compare by identity instead of by content.
///
/// Strings are routed to one of 4096 buckets by their FNV-1a hash. Each bucket is a doubly linked
/// list threaded through a slot arena, so an entry is unlinked in O(1) once its last reference is
/// released. All operations take the table's lock: lookups share it, insertions and removals take
/// it exclusively. This is the only internally synchronized structure of the asset layer.
pub struct NameTable {
    inner: RwLock<NameTableInner>,
}

impl Default for NameTable {
    fn default() -> Self {
        NameTable::new()
    }
}

impl NameTable {
    pub fn new() -> Self {
        let inner = NameTableInner {
            buckets: vec![NULL_SLOT; BUCKET_COUNT].into_boxed_slice(),
            slots: Vec::default(),
            free_slots: Vec::default(),
            len: 0,
        };

        NameTable {
            inner: RwLock::new(inner),
        }
    }

    /// The process-wide table used by [`crate::Name::new`]. Created on first use and never
    /// destroyed.
    pub fn global() -> &'static NameTable {
        &GLOBAL_NAME_TABLE
    }

    fn read(&self) -> RwLockReadGuard<'_, NameTableInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, NameTableInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the entry for `s`, adding it if needed. The caller owns one reference on the
    /// returned entry and must balance it with [`NameTable::release`].
    pub(crate) fn find_or_add(
        &self,
        s: &str,
    ) -> NameEntryRef {
        let hash = hash_str(s);
        let mut inner = self.write();

        if let Some(slot) = inner.find_slot(s, hash) {
            inner.slots[slot as usize]
                .as_ref()
                .unwrap()
                .refcount
                .fetch_add(1, Ordering::Relaxed);
            return inner.entry_ref(slot);
        }

        let bucket = (hash & BUCKET_MASK) as u32;
        let head = inner.buckets[bucket as usize];
        let slot = inner.allocate_slot();

        // Link at the head of the bucket
        if head != NULL_SLOT {
            inner.slots[head as usize].as_mut().unwrap().previous = slot;
        }

        inner.slots[slot as usize] = Some(NameTableEntry {
            string: Arc::from(s),
            hash,
            refcount: AtomicU64::new(1),
            previous: NULL_SLOT,
            next: head,
            bucket,
        });
        inner.buckets[bucket as usize] = slot;
        inner.len += 1;

        log::trace!("name table added {:?} in bucket {}", s, bucket);
        inner.entry_ref(slot)
    }

    /// Adds a reference to an entry the caller already holds a reference on
    pub(crate) fn retain(
        &self,
        entry: &NameEntryRef,
    ) {
        let inner = self.read();
        if let Some(Some(table_entry)) = inner.slots.get(entry.slot as usize) {
            table_entry.refcount.fetch_add(1, Ordering::Relaxed);
        } else {
            debug_assert!(false, "retain called on a released name entry");
        }
    }

    /// Drops a reference to an entry, removing it from the table when it was the last one
    pub(crate) fn release(
        &self,
        entry: &NameEntryRef,
    ) {
        let mut inner = self.write();
        let was_last = match inner.slots.get(entry.slot as usize) {
            Some(Some(table_entry)) => table_entry.refcount.fetch_sub(1, Ordering::AcqRel) == 1,
            _ => {
                debug_assert!(false, "release called on a released name entry");
                false
            }
        };

        if was_last {
            let removed = inner.unlink(entry.slot);
            log::trace!("name table removed {:?}", &*removed.string);
        }
    }

    /// Looks a string up without touching reference counts
    pub fn find(
        &self,
        s: &str,
    ) -> Option<NameEntryRef> {
        let hash = hash_str(s);
        let inner = self.read();
        inner.find_slot(s, hash).map(|slot| inner.entry_ref(slot))
    }

    pub fn contains(
        &self,
        s: &str,
    ) -> bool {
        self.find(s).is_some()
    }

    /// Number of live references on the entry for `s`, if it exists
    pub fn refcount(
        &self,
        s: &str,
    ) -> Option<u64> {
        let hash = hash_str(s);
        let inner = self.read();
        inner.find_slot(s, hash).map(|slot| {
            inner.slots[slot as usize]
                .as_ref()
                .unwrap()
                .refcount
                .load(Ordering::Relaxed)
        })
    }

    /// Number of distinct strings currently stored
    pub fn len(&self) -> usize {
        self.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Walks every bucket and verifies the links agree with each other and with the entry count
    #[cfg(test)]
    pub(crate) fn check_integrity(&self) {
        let inner = self.read();
        let mut count = 0;
        for (bucket, &head) in inner.buckets.iter().enumerate() {
            let mut previous = NULL_SLOT;
            let mut slot = head;
            while slot != NULL_SLOT {
                let entry = inner.slots[slot as usize].as_ref().unwrap();
                assert_eq!(entry.previous, previous);
                assert_eq!(entry.bucket as usize, bucket);
                assert_eq!((entry.hash & BUCKET_MASK) as usize, bucket);
                assert!(entry.refcount.load(Ordering::Relaxed) > 0);
                previous = slot;
                slot = entry.next;
                count += 1;
            }
        }

        assert_eq!(count, inner.len);
        assert_eq!(
            inner.slots.iter().filter(|x| x.is_some()).count(),
            inner.len
        );
    }
}
