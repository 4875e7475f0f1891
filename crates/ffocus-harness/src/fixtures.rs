#![forbid(unsafe_code)]

//! Reference records and snapshot builders.
//!
//! Two record shapes cover the two list views the engine serves: a
//! reference-data table keyed by numeric id with a business code as the
//! correlation key, and a file listing keyed by path with the file name as
//! the correlation key.

use ffocus_core::{QueryParams, Record, Snapshot, SortSpec};

/// A row in the countries reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    /// Server-assigned id.
    pub id: u32,
    /// ISO-style code, echoed back by the server on create.
    pub code: String,
    /// Display name.
    pub name: String,
}

impl Country {
    /// Build a country.
    pub fn new(id: u32, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
        }
    }

    /// Correlation key extractor.
    pub fn code_of(c: &Country) -> String {
        c.code.clone()
    }
}

impl Record for Country {
    type Id = u32;

    fn id(&self) -> &u32 {
        &self.id
    }
}

/// An entry in the file manager listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Full path; doubles as the id.
    pub path: String,
    /// File name (correlation key for uploads).
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

impl FileEntry {
    /// Build an entry under `dir`.
    pub fn new(dir: &str, name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        Self {
            path: format!("{}/{name}", dir.trim_end_matches('/')),
            name,
            size,
        }
    }

    /// Correlation key extractor.
    pub fn name_of(f: &FileEntry) -> String {
        f.name.clone()
    }
}

impl Record for FileEntry {
    type Id = String;

    fn id(&self) -> &String {
        &self.path
    }
}

/// `count` countries with ids `1..=count` and codes `C001..`, in id order.
pub fn countries(count: u32) -> Vec<Country> {
    (1..=count)
        .map(|id| Country::new(id, format!("C{id:03}"), format!("Country {id}")))
        .collect()
}

/// Countries sorted by code, as a generation-stamped snapshot.
pub fn country_snapshot(mut rows: Vec<Country>, generation: u64) -> Snapshot<Country> {
    rows.sort_by(|a, b| a.code.cmp(&b.code));
    Snapshot::new(rows)
        .with_params(QueryParams::sorted(SortSpec::ascending("code")))
        .with_generation(generation)
}

/// File entries `file-000.txt..` under `dir`.
pub fn files(dir: &str, count: usize) -> Vec<FileEntry> {
    (0..count)
        .map(|i| FileEntry::new(dir, format!("file-{i:03}.txt"), (i as u64 + 1) * 512))
        .collect()
}

/// Files sorted by name, as a generation-stamped snapshot.
pub fn file_snapshot(mut rows: Vec<FileEntry>, generation: u64) -> Snapshot<FileEntry> {
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Snapshot::new(rows)
        .with_params(QueryParams::sorted(SortSpec::ascending("name")))
        .with_generation(generation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_snapshot_sorts_by_code() {
        let mut rows = countries(3);
        rows.push(Country::new(99, "A00", "First"));
        let snap = country_snapshot(rows, 2);
        assert_eq!(snap.records()[0].id, 99);
        assert_eq!(snap.generation(), 2);
        assert_eq!(snap.params().to_string(), "sort=code:asc");
    }

    #[test]
    fn file_paths_are_ids() {
        let entry = FileEntry::new("/docs/", "a.pdf", 10);
        assert_eq!(entry.id(), "/docs/a.pdf");
        assert_eq!(FileEntry::name_of(&entry), "a.pdf");
    }
}
