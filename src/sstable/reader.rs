use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use crate::comparator::Comparator;
use crate::error::{Error, Result};
use crate::iterator::ArrayIterator;
use crate::sstable::builder::{RECORD_HEADER, RECORD_TRAILER};
use crate::sstable::footer::{Footer, TableMeta};
use crate::types::{Entry, Range};

/// An opened table, decoded and verified in full.
///
/// On open:
/// 1. Read the footer from the last bytes of the file
/// 2. Decode every record, checking lengths and checksums
/// 3. Check the keys strictly increase and the count matches the footer
///
/// Entries are shared, so iterators stay cheap and outlive the table.
pub struct Table {
    cmp: Arc<dyn Comparator>,
    entries: Arc<[Entry]>,
    meta: TableMeta,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("comparator", &self.cmp.name())
            .field("meta", &self.meta)
            .finish()
    }
}

impl Table {
    pub fn open<R: Read + Seek>(mut reader: R, cmp: Arc<dyn Comparator>) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;

        if data.len() < Footer::SIZE {
            return Err(Error::Corruption("file too short to contain footer".into()));
        }
        let body_len = data.len() - Footer::SIZE;
        let footer = Footer::decode(&data[body_len..])?;
        if footer.data_len != body_len as u64 {
            return Err(Error::Corruption(format!(
                "data length mismatch: footer says {}, file has {}",
                footer.data_len, body_len
            )));
        }

        let entries = decode_records(&data[..body_len], cmp.as_ref())?;
        if entries.len() as u64 != footer.entry_count {
            return Err(Error::Corruption(format!(
                "entry count mismatch: footer says {}, decoded {}",
                footer.entry_count,
                entries.len()
            )));
        }
        let (Some(first), Some(last)) = (entries.first(), entries.last()) else {
            return Err(Error::Corruption("table has no entries".into()));
        };
        let meta = TableMeta {
            min_key: first.0.clone(),
            max_key: last.0.clone(),
            file_size: data.len() as u64,
            entry_count: footer.entry_count,
        };
        Ok(Table {
            cmp,
            entries: entries.into(),
            meta,
        })
    }

    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Point lookup.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.entries
            .binary_search_by(|(k, _)| self.cmp.compare(k, key))
            .map(|i| self.entries[i].1.clone())
            .map_err(|_| Error::NotFound)
    }

    /// Iterator over the table, clipped to `range` when given.
    pub fn iter(&self, range: Option<&Range>) -> ArrayIterator {
        ArrayIterator::from_shared(Arc::clone(&self.cmp), Arc::clone(&self.entries), range)
    }
}

fn decode_records(mut data: &[u8], cmp: &dyn Comparator) -> Result<Vec<Entry>> {
    let mut entries: Vec<Entry> = Vec::new();
    while !data.is_empty() {
        if data.len() < RECORD_HEADER {
            return Err(Error::Corruption("truncated record header".into()));
        }
        let key_len = read_u32(&data[0..4]) as usize;
        let value_len = read_u32(&data[4..8]) as usize;
        let body_end = RECORD_HEADER + key_len + value_len;
        let record_len = body_end + RECORD_TRAILER;
        if data.len() < record_len {
            return Err(Error::Corruption("truncated record".into()));
        }
        let stored = read_u32(&data[body_end..record_len]);
        let actual = crc32fast::hash(&data[..body_end]);
        if stored != actual {
            return Err(Error::Corruption(format!(
                "record checksum mismatch: expected {stored:#x}, got {actual:#x}"
            )));
        }
        let key = &data[RECORD_HEADER..RECORD_HEADER + key_len];
        if let Some((last, _)) = entries.last() {
            if cmp.compare(key, last).is_le() {
                return Err(Error::Corruption("table keys out of order".into()));
            }
        }
        entries.push((key.to_vec(), data[RECORD_HEADER + key_len..body_end].to_vec()));
        data = &data[record_len..];
    }
    Ok(entries)
}

fn read_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}
