use crate::version::TableFile;

/// A delta between two versions: tables added to and removed from levels.
///
/// Within one edit, deletions apply before additions, so deleting and
/// re-adding the same table number in one edit keeps the new table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionEdit {
    added: Vec<(usize, TableFile)>,
    deleted: Vec<(usize, u64)>,
}

impl VersionEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(
        &mut self,
        level: usize,
        num: u64,
        size: u64,
        min_key: impl Into<Vec<u8>>,
        max_key: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.add_table_file(level, TableFile::new(num, size, min_key, max_key))
    }

    pub fn add_table_file(&mut self, level: usize, table: TableFile) -> &mut Self {
        self.added.push((level, table));
        self
    }

    pub fn delete_table(&mut self, level: usize, num: u64) -> &mut Self {
        self.deleted.push((level, num));
        self
    }

    pub fn added_tables(&self) -> &[(usize, TableFile)] {
        &self.added
    }

    pub fn deleted_tables(&self) -> &[(usize, u64)] {
        &self.deleted
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty()
    }

    /// Highest level the edit touches.
    pub fn max_level(&self) -> Option<usize> {
        let added = self.added.iter().map(|(l, _)| *l);
        let deleted = self.deleted.iter().map(|(l, _)| *l);
        added.chain(deleted).max()
    }
}
