//! Extendible hash table used as the build side of a hash join.
//!
//! The directory holds `2^global_depth` bucket handles. Several slots may
//! alias one bucket; the bucket registry owns every physical bucket exactly
//! once. Buckets store up to [`BUCKET_SIZE`] distinct keys, each mapped to a
//! growable list of row positions.

use tracing::debug;

/// Distinct keys per bucket before it has to split.
pub const BUCKET_SIZE: usize = 32;

/// Directory bits at creation (16 slots, 16 buckets).
pub const INITIAL_GLOBAL_DEPTH: u32 = 4;

/// Directory growth stops here. A full bucket at this depth overflows instead.
pub const MAX_GLOBAL_DEPTH: u32 = 24;

const INITIAL_POSITION_LIST_CAPACITY: usize = 4;

/// sdbm mixing over the little-endian bytes of the key.
#[inline]
pub fn sdbm_hash(key: i32) -> u64 {
    key.to_le_bytes().iter().fold(0u64, |res, &byte| {
        u64::from(byte)
            .wrapping_add(res << 6)
            .wrapping_add(res << 16)
            .wrapping_sub(res)
    })
}

/// Handle of a bucket in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BucketId(u32);

#[derive(Debug, Default)]
struct Bucket {
    keys: Vec<i32>,
    positions: Vec<Vec<usize>>,
    local_depth: u32,
}

impl Bucket {
    fn new(local_depth: u32) -> Self {
        Self {
            keys: Vec::with_capacity(BUCKET_SIZE),
            positions: Vec::with_capacity(BUCKET_SIZE),
            local_depth,
        }
    }

    fn find(&self, key: i32) -> Option<usize> {
        self.keys.iter().position(|&k| k == key)
    }
}

#[derive(Debug)]
pub struct ExtendibleHashTable {
    directory: Vec<BucketId>,
    buckets: Vec<Bucket>,
    global_depth: u32,
    len: usize,
    splits: usize,
}

impl Default for ExtendibleHashTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtendibleHashTable {
    pub fn new() -> Self {
        let slots = 1usize << INITIAL_GLOBAL_DEPTH;
        Self {
            directory: (0..slots as u32).map(BucketId).collect(),
            buckets: (0..slots).map(|_| Bucket::new(INITIAL_GLOBAL_DEPTH)).collect(),
            global_depth: INITIAL_GLOBAL_DEPTH,
            len: 0,
            splits: 0,
        }
    }

    /// Total number of stored positions.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn global_depth(&self) -> u32 {
        self.global_depth
    }

    pub fn directory_len(&self) -> usize {
        self.directory.len()
    }

    /// Number of physical buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn split_count(&self) -> usize {
        self.splits
    }

    pub fn distinct_keys(&self) -> usize {
        self.buckets.iter().map(|b| b.keys.len()).sum()
    }

    #[inline]
    fn slot_of(&self, key: i32) -> usize {
        (sdbm_hash(key) & ((1u64 << self.global_depth) - 1)) as usize
    }

    /// Records `position` under `key`.
    pub fn insert(&mut self, key: i32, position: usize) {
        loop {
            let bucket_id = self.directory[self.slot_of(key)];
            let global_depth = self.global_depth;
            let bucket = &mut self.buckets[bucket_id.0 as usize];

            if let Some(idx) = bucket.find(key) {
                bucket.positions[idx].push(position);
                self.len += 1;
                return;
            }

            let at_depth_limit =
                bucket.local_depth == global_depth && global_depth >= MAX_GLOBAL_DEPTH;
            if bucket.keys.len() < BUCKET_SIZE || at_depth_limit {
                let mut list = Vec::with_capacity(INITIAL_POSITION_LIST_CAPACITY);
                list.push(position);
                bucket.keys.push(key);
                bucket.positions.push(list);
                self.len += 1;
                return;
            }

            self.split_bucket(bucket_id);
        }
    }

    /// Every position stored under `key`, in insertion order.
    pub fn probe(&self, key: i32) -> &[usize] {
        let bucket = &self.buckets[self.directory[self.slot_of(key)].0 as usize];
        match bucket.find(key) {
            Some(idx) => &bucket.positions[idx],
            None => &[],
        }
    }

    /// Local depth of the bucket that `key` hashes to.
    pub fn local_depth_of(&self, key: i32) -> u32 {
        self.buckets[self.directory[self.slot_of(key)].0 as usize].local_depth
    }

    fn split_bucket(&mut self, bucket_id: BucketId) {
        if self.buckets[bucket_id.0 as usize].local_depth == self.global_depth {
            self.double_directory();
        }

        let aliases: Vec<usize> = (0..self.directory.len())
            .filter(|&slot| self.directory[slot] == bucket_id)
            .collect();
        for &slot in aliases.iter().skip(1) {
            let fresh = BucketId(self.buckets.len() as u32);
            self.buckets.push(Bucket::new(self.global_depth));
            self.directory[slot] = fresh;
        }

        let old = &mut self.buckets[bucket_id.0 as usize];
        old.local_depth = self.global_depth;
        let keys = std::mem::take(&mut old.keys);
        let positions = std::mem::take(&mut old.positions);

        for (key, list) in keys.into_iter().zip(positions) {
            let target = self.directory[self.slot_of(key)].0 as usize;
            let bucket = &mut self.buckets[target];
            bucket.keys.push(key);
            bucket.positions.push(list);
        }
        self.splits += 1;
    }

    /// Doubles the directory. Slot `i + old_len` aliases slot `i`.
    fn double_directory(&mut self) {
        let old_len = self.directory.len();
        self.directory.extend_from_within(0..old_len);
        self.global_depth += 1;
        debug!(
            global_depth = self.global_depth,
            buckets = self.buckets.len(),
            "hash directory doubled"
        );
    }
}
