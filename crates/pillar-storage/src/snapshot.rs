//! Full-database snapshot dump and load.
//!
//! File layout (all integers little-endian):
//!
//! ```text
//! +-------------------+
//! | magic "PLDB"      |
//! | version: u32      |
//! +-------------------+
//! | database name     |  string = u32 length + UTF-8 bytes
//! | table count: u32  |
//! |   table name      |
//! |   row_count: u64  |
//! |   capacity: u64   |
//! |   col count: u32  |
//! |     column name   |
//! |     index type u8 |
//! |     clustered u8  |
//! |     data: i32 * row_count
//! |     index tag u8  |  0 none, 1 b+tree (pre-order), 2 sorted
//! |     index body    |
//! +-------------------+
//! | crc32: u32        |  over everything before it
//! +-------------------+
//! ```

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use pillar_common::{IndexType, PillarError, Result};
use tracing::{debug, info};

use crate::btree::BPlusTree;
use crate::column::{Column, ColumnIndex};
use crate::database::Database;
use crate::sorted::SortedIndex;
use crate::table::Table;

const MAGIC: &[u8; 4] = b"PLDB";
const FORMAT_VERSION: u32 = 1;
const HEADER_SIZE: usize = 8;
const CHECKSUM_SIZE: usize = 4;

const INDEX_TAG_NONE: u8 = 0;
const INDEX_TAG_BTREE: u8 = 1;
const INDEX_TAG_SORTED: u8 = 2;

/// Bounds-checked reader over snapshot bytes.
pub(crate) struct SnapshotReader<'a> {
    buf: &'a [u8],
    total: usize,
}

impl<'a> SnapshotReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            total: buf.len(),
        }
    }

    pub(crate) fn offset(&self) -> usize {
        self.total - self.buf.remaining()
    }

    pub(crate) fn corrupted(&self, reason: impl Into<String>) -> PillarError {
        PillarError::SnapshotCorrupted {
            offset: self.offset(),
            reason: reason.into(),
        }
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(self.corrupted(format!(
                "truncated: need {} bytes, {} left",
                needed,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.buf.get_u64_le())
    }

    /// Reads `count` i32 values.
    pub(crate) fn i32s(&mut self, count: usize) -> Result<Vec<i32>> {
        self.ensure(count.saturating_mul(4))?;
        Ok((0..count).map(|_| self.buf.get_i32_le()).collect())
    }

    /// Reads `count` positions stored as u64.
    pub(crate) fn positions(&mut self, count: usize) -> Result<Vec<usize>> {
        self.ensure(count.saturating_mul(8))?;
        Ok((0..count).map(|_| self.buf.get_u64_le() as usize).collect())
    }

    pub(crate) fn string(&mut self) -> Result<String> {
        let len = self.u32()? as usize;
        self.ensure(len)?;
        let buf: &'a [u8] = self.buf;
        let (raw, rest) = buf.split_at(len);
        let value = std::str::from_utf8(raw)
            .map_err(|_| self.corrupted("name is not UTF-8"))?
            .to_string();
        self.buf = rest;
        Ok(value)
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

fn put_string(buf: &mut BytesMut, value: &str) {
    buf.put_u32_le(value.len() as u32);
    buf.put_slice(value.as_bytes());
}

/// Serializes a database into snapshot bytes, checksum included.
pub fn encode(db: &Database) -> Bytes {
    let mut buf = BytesMut::with_capacity(estimate_size(db));
    buf.put_slice(MAGIC);
    buf.put_u32_le(FORMAT_VERSION);

    put_string(&mut buf, db.name());
    buf.put_u32_le(db.tables().len() as u32);
    for table in db.tables() {
        put_string(&mut buf, table.name());
        buf.put_u64_le(table.row_count() as u64);
        buf.put_u64_le(table.row_capacity() as u64);
        buf.put_u32_le(table.columns().len() as u32);
        for column in table.columns() {
            encode_column(&mut buf, column);
        }
    }

    let checksum = crc32fast::hash(&buf);
    buf.put_u32_le(checksum);
    buf.freeze()
}

fn encode_column(buf: &mut BytesMut, column: &Column) {
    put_string(buf, column.name());
    buf.put_u8(column.index_type() as u8);
    buf.put_u8(u8::from(column.is_clustered()));
    for &value in column.data() {
        buf.put_i32_le(value);
    }

    match column.index() {
        ColumnIndex::None => buf.put_u8(INDEX_TAG_NONE),
        ColumnIndex::BTree(tree) => {
            buf.put_u8(INDEX_TAG_BTREE);
            tree.encode(buf);
        }
        ColumnIndex::Sorted(sorted) => {
            buf.put_u8(INDEX_TAG_SORTED);
            for &key in sorted.keys() {
                buf.put_i32_le(key);
            }
            for &pos in sorted.positions() {
                buf.put_u64_le(pos as u64);
            }
        }
    }
}

fn estimate_size(db: &Database) -> usize {
    let rows: usize = db
        .tables()
        .iter()
        .map(|t| t.row_count() * t.columns().len())
        .sum();
    HEADER_SIZE + CHECKSUM_SIZE + rows * 16 + 256
}

/// Rebuilds a database from snapshot bytes.
pub fn decode(data: &[u8]) -> Result<Database> {
    if data.len() < HEADER_SIZE + CHECKSUM_SIZE {
        return Err(PillarError::SnapshotCorrupted {
            offset: 0,
            reason: "file too short".to_string(),
        });
    }

    let (body, mut trailer) = data.split_at(data.len() - CHECKSUM_SIZE);
    let stored = trailer.get_u32_le();
    let computed = crc32fast::hash(body);
    if stored != computed {
        return Err(PillarError::SnapshotCorrupted {
            offset: body.len(),
            reason: format!(
                "checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored, computed
            ),
        });
    }

    let mut reader = SnapshotReader::new(body);
    if reader.u32()?.to_le_bytes() != *MAGIC {
        return Err(PillarError::SnapshotCorrupted {
            offset: 0,
            reason: "bad magic".to_string(),
        });
    }
    let version = reader.u32()?;
    if version != FORMAT_VERSION {
        return Err(reader.corrupted(format!("unsupported version {}", version)));
    }

    let name = reader.string()?;
    let table_count = reader.u32()? as usize;
    let mut tables = Vec::with_capacity(table_count.min(1024));
    for _ in 0..table_count {
        tables.push(decode_table(&mut reader)?);
    }

    if !reader.is_empty() {
        return Err(reader.corrupted("trailing bytes after last table"));
    }
    Ok(Database::from_parts(name, tables))
}

fn decode_table(reader: &mut SnapshotReader<'_>) -> Result<Table> {
    let name = reader.string()?;
    let row_count = reader.u64()? as usize;
    let row_capacity = reader.u64()? as usize;
    let column_count = reader.u32()? as usize;

    let mut columns = Vec::with_capacity(column_count.min(1024));
    for _ in 0..column_count {
        columns.push(decode_column(reader, row_count, row_capacity)?);
    }
    Ok(Table::from_parts(name, columns, row_count, row_capacity))
}

fn decode_column(
    reader: &mut SnapshotReader<'_>,
    row_count: usize,
    row_capacity: usize,
) -> Result<Column> {
    let name = reader.string()?;
    let index_type = IndexType::try_from(reader.u8()?)
        .map_err(|_| reader.corrupted("unknown index type"))?;
    let clustered = reader.u8()? != 0;

    let mut data = reader.i32s(row_count)?;
    data.reserve(row_capacity.saturating_sub(row_count));

    let index = match reader.u8()? {
        INDEX_TAG_NONE => ColumnIndex::None,
        INDEX_TAG_BTREE => {
            let tree = BPlusTree::decode(reader)?;
            if tree.len() != row_count {
                return Err(reader.corrupted(format!(
                    "b+tree on {} holds {} entries for {} rows",
                    name,
                    tree.len(),
                    row_count
                )));
            }
            ColumnIndex::BTree(tree)
        }
        INDEX_TAG_SORTED => {
            let keys = reader.i32s(row_count)?;
            let positions = reader.positions(row_count)?;
            ColumnIndex::Sorted(SortedIndex::from_parts(keys, positions))
        }
        tag => return Err(reader.corrupted(format!("unknown index tag {}", tag))),
    };

    let structure_matches = match (&index, index_type) {
        (ColumnIndex::None, IndexType::None | IndexType::SortedClustered) => true,
        (ColumnIndex::BTree(_), IndexType::BTreeClustered | IndexType::BTreeUnclustered) => true,
        (ColumnIndex::Sorted(_), IndexType::SortedUnclustered) => true,
        _ => false,
    };
    if !structure_matches {
        return Err(reader.corrupted(format!(
            "index structure does not match {:?} on {}",
            index_type, name
        )));
    }

    Ok(Column::from_parts(name, data, index_type, index, clustered))
}

/// Writes the snapshot to `path`, replacing any previous file.
pub fn dump(db: &Database, path: &Path) -> Result<()> {
    let bytes = encode(db);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("tmp");
    let mut file = File::create(&tmp)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp, path)?;
    info!(path = %path.display(), bytes = bytes.len(), tables = db.tables().len(), "database dumped");
    Ok(())
}

/// Reads the snapshot at `path`. A missing file yields `Ok(None)`.
pub fn load(path: &Path) -> Result<Option<Database>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no snapshot file");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let db = decode(&data)?;
    info!(path = %path.display(), db = db.name(), tables = db.tables().len(), "database loaded");
    Ok(Some(db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pillar_common::IndexType;
    use tempfile::tempdir;

    fn sample_db() -> Database {
        let mut db = Database::new("db1", 2);
        let t = db.create_table("tbl1", 3, 8);
        let table = db.table_mut(t).unwrap();
        table.add_column("a");
        table.add_column("b");
        table.add_column("c");
        table.create_index(0, IndexType::BTreeClustered, 4, 3).unwrap();
        table.create_index(1, IndexType::BTreeUnclustered, 4, 3).unwrap();
        table.create_index(2, IndexType::SortedUnclustered, 4, 3).unwrap();
        table
            .load_columns(vec![
                (0..40).map(|i| (i * 7) % 23).collect(),
                (0..40).map(|i| 100 - i).collect(),
                (0..40).map(|i| i % 5).collect(),
            ])
            .unwrap();

        let t2 = db.create_table("tbl2", 1, 4);
        db.table_mut(t2).unwrap().add_column("x");
        db
    }

    fn assert_same(a: &Database, b: &Database) {
        assert_eq!(a.name(), b.name());
        assert_eq!(a.tables().len(), b.tables().len());
        for (ta, tb) in a.tables().iter().zip(b.tables()) {
            assert_eq!(ta.name(), tb.name());
            assert_eq!(ta.row_count(), tb.row_count());
            for (ca, cb) in ta.columns().iter().zip(tb.columns()) {
                assert_eq!(ca.name(), cb.name());
                assert_eq!(ca.data(), cb.data());
                assert_eq!(ca.index_type(), cb.index_type());
                assert_eq!(ca.is_clustered(), cb.is_clustered());
                match (ca.index(), cb.index()) {
                    (ColumnIndex::None, ColumnIndex::None) => {}
                    (ColumnIndex::BTree(x), ColumnIndex::BTree(y)) => {
                        assert_eq!(x.iter().collect::<Vec<_>>(), y.iter().collect::<Vec<_>>());
                        assert_eq!(x.height(), y.height());
                    }
                    (ColumnIndex::Sorted(x), ColumnIndex::Sorted(y)) => assert_eq!(x, y),
                    _ => panic!("index structure changed for {}", ca.name()),
                }
            }
        }
    }

    #[test]
    fn test_encode_decode_preserves_structure() {
        let db = sample_db();
        let bytes = encode(&db);
        let restored = decode(&bytes).unwrap();
        assert_same(&db, &restored);
    }

    #[test]
    fn test_restored_tree_accepts_inserts() {
        let db = sample_db();
        let mut restored = decode(&encode(&db)).unwrap();
        let table = restored.table_mut(crate::TableId(0)).unwrap();
        let pos = table.insert_row(&[5, 1000, 1]).unwrap();

        let ColumnIndex::BTree(tree) = table.column(0).unwrap().index() else {
            panic!("expected b+tree");
        };
        let chain: Vec<(i32, usize)> = tree.iter().collect();
        assert_eq!(chain.len(), 41);
        for (i, (key, p)) in chain.iter().enumerate() {
            assert_eq!(*p, i);
            assert_eq!(*key, table.column(0).unwrap().data()[i]);
        }
        assert_eq!(table.column(1).unwrap().data()[pos], 1000);
    }

    #[test]
    fn test_checksum_detects_flipped_byte() {
        let bytes = encode(&sample_db());
        let mut corrupted = bytes.to_vec();
        corrupted[20] ^= 0xFF;
        let err = decode(&corrupted).unwrap_err();
        assert!(matches!(err, PillarError::SnapshotCorrupted { .. }));
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_truncated_file_rejected() {
        let bytes = encode(&sample_db());
        assert!(decode(&bytes[..6]).is_err());

        // Re-seal a truncated body so only the structural checks can fail.
        let mut body = bytes[..bytes.len() / 2].to_vec();
        let checksum = crc32fast::hash(&body);
        body.put_u32_le(checksum);
        let err = decode(&body).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut raw = encode(&sample_db()).to_vec();
        raw[0] = b'X';
        let len = raw.len();
        let checksum = crc32fast::hash(&raw[..len - CHECKSUM_SIZE]);
        raw[len - CHECKSUM_SIZE..].copy_from_slice(&checksum.to_le_bytes());
        let err = decode(&raw).unwrap_err();
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_dump_and_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("pillar.snapshot");
        let db = sample_db();

        dump(&db, &path).unwrap();
        assert!(!path.with_extension("tmp").exists());
        let restored = load(&path).unwrap().unwrap();
        assert_same(&db, &restored);

        // A second dump replaces the synced file in place.
        dump(&restored, &path).unwrap();
        assert_same(&db, &load(&path).unwrap().unwrap());
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempdir().unwrap();
        assert!(load(&dir.path().join("absent")).unwrap().is_none());
    }
}
