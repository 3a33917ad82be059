use crate::error::{Error, Result};

/// Magic number closing every table file ("LSM_SST\0").
pub const TABLE_MAGIC: u64 = 0x4C534D5F53535400;

/// Metadata about a finished table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    /// Smallest key in the table.
    pub min_key: Vec<u8>,
    /// Largest key in the table.
    pub max_key: Vec<u8>,
    /// File size in bytes, footer included.
    pub file_size: u64,
    pub entry_count: u64,
}

/// The footer sits at the end of a table file.
///
/// ```text
/// ┌──────────────────────────────────────┐
/// │ Entry count (8B)                     │
/// │ Data length (8B)                     │
/// │ Magic number (8B)                    │
/// └──────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub entry_count: u64,
    /// Bytes of record data preceding the footer.
    pub data_len: u64,
}

impl Footer {
    pub const SIZE: usize = 8 * 3;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..8].copy_from_slice(&self.entry_count.to_le_bytes());
        buf[8..16].copy_from_slice(&self.data_len.to_le_bytes());
        buf[16..24].copy_from_slice(&TABLE_MAGIC.to_le_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Corruption("footer too short".into()));
        }
        let entry_count = read_u64(&data[0..8]);
        let data_len = read_u64(&data[8..16]);
        let magic = read_u64(&data[16..24]);
        if magic != TABLE_MAGIC {
            return Err(Error::Corruption(format!(
                "bad magic: expected {TABLE_MAGIC:#x}, got {magic:#x}"
            )));
        }
        Ok(Footer { entry_count, data_len })
    }
}

fn read_u64(b: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&b[..8]);
    u64::from_le_bytes(buf)
}
