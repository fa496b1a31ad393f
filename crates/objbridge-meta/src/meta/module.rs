//! Module and library records
//!
//! Layout: flags `u8`, name pointer, and for modules a pointer to an array
//! of library pointers.

use super::flags::{LibraryFlags, ModuleFlags};
use crate::file::MetaFile;
use crate::heap::{read_u8, Array, FromHeap, RelPtr};
use std::fmt;

/// A top-level module (framework or library) owning entities
#[derive(Clone, Copy)]
pub struct ModuleMeta<'a> {
    file: MetaFile<'a>,
    pos: usize,
}

impl<'a> ModuleMeta<'a> {
    /// Absolute position of the record
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Module flags
    pub fn flags(&self) -> ModuleFlags {
        ModuleFlags::from_bits(read_u8(self.file.blob(), self.pos))
    }

    /// Whether the module is a framework
    pub fn is_framework(&self) -> bool {
        self.flags().framework
    }

    /// Whether the module ships with the system
    pub fn is_system(&self) -> bool {
        self.flags().system
    }

    /// Module name
    pub fn name(&self) -> &'a str {
        RelPtr::<&'a str>::read(self.file.blob(), self.pos + 1)
            .value(self.file)
            .unwrap_or("")
    }

    /// Libraries the module links against
    pub fn libraries(&self) -> Array<'a, RelPtr<LibraryMeta<'a>>> {
        Array::resolve(RelPtr::read(self.file.blob(), self.pos + 5), self.file)
    }
}

impl<'a> FromHeap<'a> for ModuleMeta<'a> {
    fn from_heap(file: MetaFile<'a>, pos: usize) -> Self {
        Self { file, pos }
    }
}

impl fmt::Debug for ModuleMeta<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleMeta")
            .field("name", &self.name())
            .field("flags", &self.flags())
            .finish()
    }
}

/// A library linked by a module
#[derive(Clone, Copy)]
pub struct LibraryMeta<'a> {
    file: MetaFile<'a>,
    pos: usize,
}

impl<'a> LibraryMeta<'a> {
    /// Library flags
    pub fn flags(&self) -> LibraryFlags {
        LibraryFlags::from_bits(read_u8(self.file.blob(), self.pos))
    }

    /// Whether the library is a framework
    pub fn is_framework(&self) -> bool {
        self.flags().framework
    }

    /// Library name
    pub fn name(&self) -> &'a str {
        RelPtr::<&'a str>::read(self.file.blob(), self.pos + 1)
            .value(self.file)
            .unwrap_or("")
    }
}

impl<'a> FromHeap<'a> for LibraryMeta<'a> {
    fn from_heap(file: MetaFile<'a>, pos: usize) -> Self {
        Self { file, pos }
    }
}

impl fmt::Debug for LibraryMeta<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryMeta")
            .field("name", &self.name())
            .field("framework", &self.is_framework())
            .finish()
    }
}
