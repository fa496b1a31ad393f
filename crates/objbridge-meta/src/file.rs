//! Opening a metadata blob
//!
//! [`MetaFile`] is the context every view carries: the blob, where its
//! three regions start, and the system version availability checks run
//! against. It is `Copy` and cheap to pass around; views borrow the blob
//! for `'a`.

use crate::error::MetaError;
use crate::heap::{read_i32, Array, ArrayCount, RelPtr, PTR_SIZE};
use crate::meta::ModuleMeta;
use crate::table::GlobalTable;
use crate::version::SystemVersion;
use once_cell::sync::OnceCell;
use std::fmt;

const COUNT_SIZE: usize = std::mem::size_of::<ArrayCount>();

/// A loaded metadata blob
#[derive(Clone, Copy)]
pub struct MetaFile<'a> {
    blob: &'a [u8],
    modules_pos: usize,
    heap_base: usize,
    system: SystemVersion,
}

impl<'a> MetaFile<'a> {
    /// Open `blob`, checking that both table headers and bodies fit.
    ///
    /// Records in the heap are not validated; see the crate-level notes on
    /// trusted input.
    pub fn new(blob: &'a [u8], system: SystemVersion) -> Result<Self, MetaError> {
        let buckets = table_count(blob, 0, "global table")?;
        let modules_pos = COUNT_SIZE + buckets * PTR_SIZE;
        let modules = table_count(blob, modules_pos, "module table")?;
        let heap_base = modules_pos + COUNT_SIZE + modules * PTR_SIZE;

        log::debug!(
            "metadata blob: {} bytes, {} buckets, {} modules, heap at {:#x}, system {}",
            blob.len(),
            buckets,
            modules,
            heap_base,
            system
        );

        Ok(Self {
            blob,
            modules_pos,
            heap_base,
            system,
        })
    }

    /// Raw blob bytes
    pub fn blob(&self) -> &'a [u8] {
        self.blob
    }

    /// Version availability checks are evaluated against
    pub fn system_version(&self) -> SystemVersion {
        self.system
    }

    /// Same blob, queried for another system version
    pub fn with_system_version(self, system: SystemVersion) -> Self {
        Self { system, ..self }
    }

    /// Absolute position relative pointers are resolved from
    pub fn heap_base(&self) -> usize {
        self.heap_base
    }

    /// Name-hash buckets of all top-level entities
    pub fn global_table(&self) -> GlobalTable<'a> {
        GlobalTable::at(*self, 0)
    }

    /// Pointers to every top-level module
    pub fn module_table(&self) -> Array<'a, RelPtr<ModuleMeta<'a>>> {
        Array::at(*self, self.modules_pos)
    }

    /// Top-level modules in table order
    pub fn modules(&self) -> impl Iterator<Item = ModuleMeta<'a>> + 'a {
        let file = *self;
        self.module_table()
            .into_iter()
            .filter_map(move |ptr| ptr.value(file))
    }

    /// Whether both files view the very same bytes
    pub fn same_blob(&self, other: &MetaFile<'_>) -> bool {
        std::ptr::eq(self.blob, other.blob)
    }
}

fn table_count(blob: &[u8], pos: usize, section: &'static str) -> Result<usize, MetaError> {
    if blob.len() < pos + COUNT_SIZE {
        return Err(MetaError::Truncated {
            section,
            needed: pos + COUNT_SIZE,
            len: blob.len(),
        });
    }
    let count = read_i32(blob, pos);
    if count < 0 {
        return Err(MetaError::NegativeCount { section, count });
    }
    let needed = pos + COUNT_SIZE + count as usize * PTR_SIZE;
    if blob.len() < needed {
        return Err(MetaError::Truncated {
            section,
            needed,
            len: blob.len(),
        });
    }
    Ok(count as usize)
}

impl fmt::Debug for MetaFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaFile")
            .field("len", &self.blob.len())
            .field("modules_pos", &self.modules_pos)
            .field("heap_base", &self.heap_base)
            .field("system", &self.system)
            .finish()
    }
}

static INSTANCE: OnceCell<MetaFile<'static>> = OnceCell::new();

/// Install the process-wide metadata file. Only the first call succeeds.
pub fn install(blob: &'static [u8], system: SystemVersion) -> Result<MetaFile<'static>, MetaError> {
    let file = MetaFile::new(blob, system)?;
    INSTANCE
        .set(file)
        .map_err(|_| MetaError::AlreadyInstalled)?;
    log::info!("installed metadata file ({} bytes)", blob.len());
    Ok(file)
}

/// The process-wide metadata file, if one was installed
pub fn instance() -> Option<MetaFile<'static>> {
    INSTANCE.get().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{MetadataWriter, ModuleDef};

    #[test]
    fn test_rejects_truncated_tables() {
        let err = MetaFile::new(&[1, 0], SystemVersion::LATEST).unwrap_err();
        assert!(matches!(err, MetaError::Truncated { section: "global table", .. }));

        // 2 buckets claimed, only one pointer present
        let blob = [2, 0, 0, 0, 0, 0, 0, 0];
        let err = MetaFile::new(&blob, SystemVersion::LATEST).unwrap_err();
        assert!(matches!(err, MetaError::Truncated { needed: 12, len: 8, .. }));

        let blob = [0, 0, 0, 0];
        let err = MetaFile::new(&blob, SystemVersion::LATEST).unwrap_err();
        assert!(matches!(err, MetaError::Truncated { section: "module table", .. }));
    }

    #[test]
    fn test_rejects_negative_count() {
        let blob = (-1i32).to_le_bytes();
        let err = MetaFile::new(&blob, SystemVersion::LATEST).unwrap_err();
        assert!(matches!(err, MetaError::NegativeCount { count: -1, .. }));
    }

    #[test]
    fn test_regions() {
        let mut writer = MetadataWriter::new(3);
        writer.add_module(ModuleDef::new("Foundation").framework(true));
        let blob = writer.finish();
        let file = MetaFile::new(&blob, SystemVersion::new(9, 0)).unwrap();

        assert_eq!(file.global_table().bucket_count(), 3);
        assert_eq!(file.heap_base(), 4 + 3 * 4 + 4 + 4);
        let names: Vec<_> = file.modules().map(|m| m.name()).collect();
        assert_eq!(names, ["Foundation"]);
        assert!(file.modules().all(|m| m.is_framework()));

        let other = file.with_system_version(SystemVersion::LATEST);
        assert!(file.same_blob(&other));
        assert_eq!(other.system_version(), SystemVersion::LATEST);
    }

    #[test]
    fn test_install_once() {
        let mut writer = MetadataWriter::new(1);
        writer.add_module(ModuleDef::new("UIKit"));
        let blob: &'static [u8] = Box::leak(writer.finish().into_boxed_slice());

        let first = install(blob, SystemVersion::LATEST);
        let second = install(blob, SystemVersion::LATEST);
        // Either this test installed first, or something else in the process did.
        assert!(first.is_ok() || second.is_err());
        assert!(matches!(second, Err(MetaError::AlreadyInstalled)));
        assert!(instance().is_some());
    }
}
