//! Page-derived sizing constants shared by the index and join code.

/// Memory page size in bytes. Index nodes and join tiles are sized to it.
pub const PAGE_SIZE: usize = 4096;

/// Maximum child links per B+tree internal node (`FANOUT - 1` keys).
/// 335 children of (i32 key + 8 byte link) fit one page with its header.
pub const FANOUT: usize = 335;

/// Maximum (key, position) entries per B+tree leaf.
/// 501 entries of 8 bytes fit one page with the neighbour links.
pub const LEAF_SIZE: usize = 501;

/// Upper bound on B+tree height accepted when decoding a snapshot.
pub const MAX_TREE_HEIGHT: usize = 512;

/// Number of elements of `T` that fit one page.
pub const fn tile_len<T>() -> usize {
    PAGE_SIZE / std::mem::size_of::<T>()
}
