//! Global Table: name-hash buckets of every top-level entity
//!
//! The table is an array of buckets indexed by `name_hash(js_name) %
//! bucket_count`. Each bucket points to an array of entity records sorted by
//! scripting name, so a lookup is one hash, one binary search and a short
//! forward scan over equal names.

use crate::file::MetaFile;
use crate::hash::name_hash;
use crate::heap::{Array, RelPtr};
use crate::meta::{Entity, InterfaceMeta, MetaHeader, MetaKind, MetaRecord, ProtocolMeta};
use rustc_hash::FxHashSet;

type Bucket<'a> = Array<'a, RelPtr<MetaHeader<'a>>>;

/// View of the Global Table
#[derive(Debug, Clone, Copy)]
pub struct GlobalTable<'a> {
    file: MetaFile<'a>,
    buckets: Array<'a, RelPtr<Bucket<'a>>>,
}

impl<'a> GlobalTable<'a> {
    pub(crate) fn at(file: MetaFile<'a>, pos: usize) -> Self {
        Self {
            file,
            buckets: Array::at(file, pos),
        }
    }

    /// Number of hash buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Encoded size of the table header
    pub fn size_in_bytes(&self) -> usize {
        self.buckets.size_in_bytes()
    }

    /// Number of entities [`GlobalTable::iter`] yields. Records with the
    /// undefined kind tag are not counted.
    pub fn entity_count(&self) -> usize {
        self.iter().count()
    }

    fn bucket(&self, hash: u32) -> Option<Bucket<'a>> {
        if self.buckets.is_empty() {
            return None;
        }
        let index = hash as usize % self.buckets.len();
        self.buckets.get(index)?.value(self.file)
    }

    /// First entity named `name`, skipping unavailable ones when
    /// `only_if_available` is set.
    pub fn find_meta(&self, name: &str, only_if_available: bool) -> Option<Entity<'a>> {
        let name = name.as_bytes();
        self.find_meta_raw(name, name_hash(name), only_if_available)
    }

    /// [`GlobalTable::find_meta`] with a precomputed [`name_hash`].
    pub fn find_meta_raw(
        &self,
        name: &[u8],
        hash: u32,
        only_if_available: bool,
    ) -> Option<Entity<'a>> {
        self.find_where(name, hash, |entity| {
            !only_if_available || entity.is_available()
        })
    }

    /// Interface named `name`.
    ///
    /// When the interface exists but is not available on the system
    /// version, its nearest available base class stands in for it.
    pub fn find_interface_meta(&self, name: &str) -> Option<InterfaceMeta<'a>> {
        let name = name.as_bytes();
        self.find_interface_meta_raw(name, name_hash(name))
    }

    /// [`GlobalTable::find_interface_meta`] with a precomputed hash.
    pub fn find_interface_meta_raw(&self, name: &[u8], hash: u32) -> Option<InterfaceMeta<'a>> {
        let mut meta = self.find_kind(name, hash, MetaKind::Interface)?.as_interface()?;
        let mut visited = FxHashSet::default();
        while !meta.is_available() {
            if !visited.insert(meta.position()) {
                log::warn!("inheritance cycle through {}", meta.js_name());
                return None;
            }
            let base_name = meta.base_name()?;
            log::warn!(
                "interface {} is not available on {}, using base class {}",
                meta.js_name(),
                self.file.system_version(),
                base_name
            );
            let base = base_name.as_bytes();
            meta = self
                .find_kind(base, name_hash(base), MetaKind::Interface)?
                .as_interface()?;
        }
        Some(meta)
    }

    /// Protocol named `name`, whatever its availability.
    pub fn find_protocol(&self, name: &str) -> Option<ProtocolMeta<'a>> {
        let name = name.as_bytes();
        self.find_protocol_raw(name, name_hash(name))
    }

    /// [`GlobalTable::find_protocol`] with a precomputed hash.
    pub fn find_protocol_raw(&self, name: &[u8], hash: u32) -> Option<ProtocolMeta<'a>> {
        self.find_kind(name, hash, MetaKind::Protocol)?.as_protocol()
    }

    fn find_kind(&self, name: &[u8], hash: u32, kind: MetaKind) -> Option<Entity<'a>> {
        self.find_where(name, hash, |entity| entity.kind() == kind)
    }

    /// First entity in the name's bucket with scripting name `name` that
    /// satisfies `accept`. Records with the undefined kind tag are skipped.
    fn find_where<F>(&self, name: &[u8], hash: u32, accept: F) -> Option<Entity<'a>>
    where
        F: Fn(&Entity<'a>) -> bool,
    {
        let bucket = self.bucket(hash)?;
        let file = self.file;
        let start = bucket.binary_search_leftmost(|ptr| {
            ptr.value(file)
                .map_or(&[][..], |header| header.js_name().as_bytes())
                .cmp(name)
        });
        if start < 0 {
            return None;
        }
        bucket
            .iter()
            .skip(start as usize)
            .map_while(|ptr| ptr.value(file))
            .take_while(|header| header.js_name().as_bytes() == name)
            .filter_map(Entity::from_header)
            .find(|entity| accept(entity))
    }

    /// Every entity in bucket order, then in order within each bucket.
    pub fn iter(&self) -> GlobalTableIter<'a> {
        GlobalTableIter {
            table: *self,
            bucket_index: 0,
            current: None,
        }
    }
}

impl<'a> IntoIterator for GlobalTable<'a> {
    type Item = Entity<'a>;
    type IntoIter = GlobalTableIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the Global Table
pub struct GlobalTableIter<'a> {
    table: GlobalTable<'a>,
    bucket_index: usize,
    current: Option<crate::heap::ArrayIter<'a, RelPtr<MetaHeader<'a>>>>,
}

impl<'a> Iterator for GlobalTableIter<'a> {
    type Item = Entity<'a>;

    fn next(&mut self) -> Option<Entity<'a>> {
        let file = self.table.file;
        loop {
            if let Some(entries) = &mut self.current {
                for ptr in entries.by_ref() {
                    if let Some(entity) = ptr.value(file).and_then(Entity::from_header) {
                        return Some(entity);
                    }
                }
                self.current = None;
            }
            let bucket = self.table.buckets.get(self.bucket_index)?;
            self.bucket_index += 1;
            if let Some(entries) = bucket.value(file) {
                self.current = Some(entries.iter());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::SystemVersion;
    use crate::writer::{
        ClassDef, EncodingDef, FunctionDef, HeapWriter, MetaDef, MetadataWriter, RecordDef,
    };

    fn blob() -> Vec<u8> {
        let mut writer = MetadataWriter::new(4);
        writer.add_struct(RecordDef::new(MetaDef::new("CGPoint")).field("x", EncodingDef::double()));
        writer.add_function(FunctionDef::new(MetaDef::new("NSLog"), vec![EncodingDef::void()]));
        writer.add_interface(ClassDef::new(MetaDef::new("NSObject")));
        writer.add_protocol(ClassDef::new(MetaDef::new("NSCopying")));
        writer.finish()
    }

    #[test]
    fn test_iter_visits_every_entity() {
        let bytes = blob();
        let file = MetaFile::new(&bytes, SystemVersion::LATEST).unwrap();
        let table = file.global_table();
        assert_eq!(table.bucket_count(), 4);
        assert_eq!(table.entity_count(), 4);
        let mut names: Vec<_> = table.iter().map(|e| e.js_name()).collect();
        names.sort_unstable();
        assert_eq!(names, ["CGPoint", "NSCopying", "NSLog", "NSObject"]);
    }

    #[test]
    fn test_kind_filters() {
        let bytes = blob();
        let file = MetaFile::new(&bytes, SystemVersion::LATEST).unwrap();
        let table = file.global_table();
        assert_eq!(table.find_meta("NSLog", true).map(|e| e.kind()), Some(MetaKind::Function));
        assert!(table.find_interface_meta("NSObject").is_some());
        assert!(table.find_interface_meta("NSCopying").is_none());
        assert!(table.find_protocol("NSCopying").is_some());
        assert!(table.find_protocol("NSObject").is_none());
        assert!(table.find_meta("NSString", false).is_none());
    }

    #[test]
    fn test_empty_table() {
        let bytes = MetadataWriter::new(0).finish();
        let file = MetaFile::new(&bytes, SystemVersion::LATEST).unwrap();
        let table = file.global_table();
        assert_eq!(table.iter().count(), 0);
        assert!(table.find_meta("anything", false).is_none());
    }

    #[test]
    fn test_undefined_kind_records_are_skipped() {
        // One bucket holding a record with kind tag 0 and a function.
        let mut heap = HeapWriter::new();
        let ghost_name = heap.string("Ghost");
        let ghost = heap.offset();
        heap.emit_i32(ghost_name);
        heap.emit_i32(0);
        heap.emit_u8(0);
        heap.emit_u8(0);
        let bucket = heap.ptr_array(&[ghost]);
        let heap = heap.into_bytes();

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&bucket.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&heap);

        let file = MetaFile::new(&bytes, SystemVersion::LATEST).unwrap();
        let table = file.global_table();
        assert_eq!(table.iter().count(), 0);
        assert_eq!(table.entity_count(), 0);
        assert!(table.find_meta("Ghost", false).is_none());
    }

    #[test]
    fn test_unavailable_interface_cycle_resolves_to_none() {
        let mut writer = MetadataWriter::new(2);
        writer.add_interface(ClassDef::new(MetaDef::new("X").introduced(15, 0)).base("Y"));
        writer.add_interface(ClassDef::new(MetaDef::new("Y").introduced(15, 0)).base("X"));
        let bytes = writer.finish();
        let file = MetaFile::new(&bytes, SystemVersion::new(14, 0)).unwrap();
        let table = file.global_table();
        assert!(table.find_interface_meta("X").is_none());
        assert!(table.find_interface_meta("Y").is_none());
        assert_eq!(table.find_meta("X", false).map(|e| e.kind()), Some(MetaKind::Interface));
    }
}
