use std::sync::Arc;

use crate::comparator::Comparator;
use crate::error::{Error, Result};
use crate::sstable::footer::{Footer, TableMeta};
use crate::storage::StorageWriter;

/// Bytes of fixed record header: key length and value length.
pub(crate) const RECORD_HEADER: usize = 8;
/// Bytes of record trailer: the checksum.
pub(crate) const RECORD_TRAILER: usize = 4;

/// Writes a table from a sorted stream of key/value pairs.
///
/// Each record is `key_len u32 | value_len u32 | key | value | crc32`,
/// little endian, with the checksum covering everything before it in the
/// record. A [`Footer`] closes the file.
///
/// Used when flushing a memtable or writing compaction output.
pub struct TableBuilder<W: StorageWriter> {
    writer: W,
    cmp: Arc<dyn Comparator>,
    /// Scratch buffer reused for each record.
    buf: Vec<u8>,
    /// Record bytes written so far.
    offset: u64,
    min_key: Option<Vec<u8>>,
    /// Last key added, the table's max key once finished.
    last_key: Option<Vec<u8>>,
    entry_count: u64,
}

impl<W: StorageWriter> TableBuilder<W> {
    pub fn new(writer: W, cmp: Arc<dyn Comparator>) -> Self {
        TableBuilder {
            writer,
            cmp,
            buf: Vec::new(),
            offset: 0,
            min_key: None,
            last_key: None,
            entry_count: 0,
        }
    }

    /// Appends a record. Keys must strictly increase.
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if let Some(last) = &self.last_key {
            if self.cmp.compare(key, last).is_le() {
                return Err(Error::InvalidArgument(
                    "table keys must be added in strictly increasing order".into(),
                ));
            }
        }
        let key_len = u32::try_from(key.len()).map_err(|_| Error::InvalidArgument("key too large".into()))?;
        let value_len = u32::try_from(value.len()).map_err(|_| Error::InvalidArgument("value too large".into()))?;

        self.buf.clear();
        self.buf.extend_from_slice(&key_len.to_le_bytes());
        self.buf.extend_from_slice(&value_len.to_le_bytes());
        self.buf.extend_from_slice(key);
        self.buf.extend_from_slice(value);
        let crc = crc32fast::hash(&self.buf);
        self.buf.extend_from_slice(&crc.to_le_bytes());
        self.writer.write_all(&self.buf)?;

        self.offset += self.buf.len() as u64;
        self.entry_count += 1;
        if self.min_key.is_none() {
            self.min_key = Some(key.to_vec());
        }
        match &mut self.last_key {
            Some(last) => {
                last.clear();
                last.extend_from_slice(key);
            }
            None => self.last_key = Some(key.to_vec()),
        }
        Ok(())
    }

    /// Entries added so far.
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Bytes the file would take if finished now.
    pub fn estimated_size(&self) -> u64 {
        self.offset + Footer::SIZE as u64
    }

    /// Writes the footer and syncs. An empty table is rejected.
    pub fn finish(mut self) -> Result<TableMeta> {
        let (Some(min_key), Some(max_key)) = (self.min_key.take(), self.last_key.take()) else {
            return Err(Error::InvalidArgument("cannot finish an empty table".into()));
        };
        let footer = Footer {
            entry_count: self.entry_count,
            data_len: self.offset,
        };
        self.writer.write_all(&footer.encode())?;
        self.writer.flush()?;
        self.writer.sync()?;
        Ok(TableMeta {
            min_key,
            max_key,
            file_size: self.offset + Footer::SIZE as u64,
            entry_count: self.entry_count,
        })
    }
}
