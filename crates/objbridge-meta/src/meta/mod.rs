//! Entity records
//!
//! Every record starts with the same 10-byte header (names, module, flags,
//! introduced version) followed by a kind-specific tail. Each kind is its
//! own view type wrapping a [`MetaHeader`]; top-level entities found in the
//! Global Table are dispatched through the closed [`Entity`] enum by the
//! kind tag, so no view is ever built over the wrong tail.

mod class;
mod flags;
mod member;
mod module;
mod record;

pub use class::{Ancestors, BaseClassMeta, InterfaceMeta, ProtocolMeta};
pub(crate) use flags::HAS_NAME;
pub use flags::{FunctionFlags, LibraryFlags, MethodFlags, ModuleFlags, PropertyFlags};
pub use member::{
    select_overload, MemberKind, MemberMeta, MembersCollection, MethodMeta, PropertyMeta,
};
pub use module::{LibraryMeta, ModuleMeta};
pub use record::{FunctionMeta, JsCodeMeta, RecordMeta, VarMeta};

use crate::file::MetaFile;
use crate::heap::{read_u8, FromHeap, RelPtr, PTR_SIZE};
use crate::version::{major_of, minor_of};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Size of the common header
pub const HEADER_SIZE: usize = 10;

const NAMES_OFFSET: usize = 0;
const MODULE_OFFSET: usize = 4;
const FLAGS_OFFSET: usize = 8;
const INTRODUCED_OFFSET: usize = 9;

/// Kind tag of a top-level entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MetaKind {
    /// C struct
    Struct = 1,
    /// C union
    Union = 2,
    /// C function
    Function = 3,
    /// Inline script source
    JsCode = 4,
    /// Global variable or constant
    Var = 5,
    /// Class interface
    Interface = 6,
    /// Protocol
    Protocol = 7,
}

impl MetaKind {
    /// Decode the kind from a header flags byte; `None` for the undefined tag
    pub fn from_flags(flags: u8) -> Option<Self> {
        Some(match flags & flags::KIND_MASK {
            1 => MetaKind::Struct,
            2 => MetaKind::Union,
            3 => MetaKind::Function,
            4 => MetaKind::JsCode,
            5 => MetaKind::Var,
            6 => MetaKind::Interface,
            7 => MetaKind::Protocol,
            _ => return None,
        })
    }

    /// Tag value
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Lower-case display name
    pub fn name(self) -> &'static str {
        match self {
            MetaKind::Struct => "struct",
            MetaKind::Union => "union",
            MetaKind::Function => "function",
            MetaKind::JsCode => "jscode",
            MetaKind::Var => "var",
            MetaKind::Interface => "interface",
            MetaKind::Protocol => "protocol",
        }
    }
}

impl fmt::Display for MetaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The header shared by every entity record
#[derive(Clone, Copy)]
pub struct MetaHeader<'a> {
    file: MetaFile<'a>,
    pos: usize,
}

impl<'a> MetaHeader<'a> {
    /// View the header at absolute position `pos`
    pub fn at(file: MetaFile<'a>, pos: usize) -> Self {
        Self { file, pos }
    }

    /// File this record lives in
    pub fn file(&self) -> MetaFile<'a> {
        self.file
    }

    /// Absolute position of the record; identifies the entity
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Position of byte `offset` of the kind-specific tail
    pub(crate) fn tail(&self, offset: usize) -> usize {
        self.pos + HEADER_SIZE + offset
    }

    pub(crate) fn read_ptr<T>(&self, tail_offset: usize) -> RelPtr<T> {
        RelPtr::read(self.file.blob(), self.tail(tail_offset))
    }

    /// Raw flags byte
    pub fn flags(&self) -> u8 {
        read_u8(self.file.blob(), self.pos + FLAGS_OFFSET)
    }

    /// Kind tag. Only meaningful for top-level entities: member records
    /// reuse the low bits for their own flags.
    pub fn kind(&self) -> Option<MetaKind> {
        MetaKind::from_flags(self.flags())
    }

    /// Whether the record stores separate scripting and native names
    pub fn has_dual_name(&self) -> bool {
        self.flags() & (1 << flags::HAS_NAME) != 0
    }

    fn names_ptr(&self) -> RelPtr<&'a str> {
        RelPtr::read(self.file.blob(), self.pos + NAMES_OFFSET)
    }

    /// Name exposed to scripts
    pub fn js_name(&self) -> &'a str {
        let names = self.names_ptr();
        if self.has_dual_name() {
            names
                .address(self.file)
                .and_then(|pair| RelPtr::<&'a str>::read(self.file.blob(), pair).value(self.file))
                .unwrap_or("")
        } else {
            names.value(self.file).unwrap_or("")
        }
    }

    /// Native name; equals the scripting name unless both are stored
    pub fn name(&self) -> &'a str {
        if !self.has_dual_name() {
            return self.js_name();
        }
        self.names_ptr()
            .address(self.file)
            .and_then(|pair| {
                RelPtr::<&'a str>::read(self.file.blob(), pair + PTR_SIZE).value(self.file)
            })
            .unwrap_or("")
    }

    /// Owning top-level module
    pub fn module(&self) -> Option<ModuleMeta<'a>> {
        RelPtr::<ModuleMeta<'a>>::read(self.file.blob(), self.pos + MODULE_OFFSET).value(self.file)
    }

    /// Encoded version the entity was introduced in (0 when unrecorded)
    pub fn introduced_in(&self) -> u8 {
        read_u8(self.file.blob(), self.pos + INTRODUCED_OFFSET)
    }

    /// Whether the entity exists on the system version of the file
    pub fn is_available(&self) -> bool {
        self.file.system_version().admits(self.introduced_in())
    }
}

impl<'a> FromHeap<'a> for MetaHeader<'a> {
    fn from_heap(file: MetaFile<'a>, pos: usize) -> Self {
        Self { file, pos }
    }
}

impl PartialEq for MetaHeader<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos && self.file.same_blob(&other.file)
    }
}

impl Eq for MetaHeader<'_> {}

impl Hash for MetaHeader<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pos.hash(state);
    }
}

impl fmt::Debug for MetaHeader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaHeader")
            .field("pos", &self.pos)
            .field("js_name", &self.js_name())
            .field("flags", &format_args!("{:#010b}", self.flags()))
            .finish()
    }
}

/// Accessors every record view gets from its header
pub trait MetaRecord<'a>: Copy {
    /// The common header
    fn header(&self) -> MetaHeader<'a>;

    /// Name exposed to scripts
    fn js_name(&self) -> &'a str {
        self.header().js_name()
    }

    /// Native name
    fn name(&self) -> &'a str {
        self.header().name()
    }

    /// Owning module
    fn module(&self) -> Option<ModuleMeta<'a>> {
        self.header().module()
    }

    /// Encoded introduced-in version
    fn introduced_in(&self) -> u8 {
        self.header().introduced_in()
    }

    /// Whether the record is available on the file's system version
    fn is_available(&self) -> bool {
        self.header().is_available()
    }

    /// Absolute position; identifies the record
    fn position(&self) -> usize {
        self.header().position()
    }
}

/// Implements `FromHeap`, `MetaRecord`, equality by identity and `Debug`
/// for a view that is a thin wrapper over its header.
macro_rules! record_view {
    ($ty:ident) => {
        impl<'a> $crate::heap::FromHeap<'a> for $ty<'a> {
            fn from_heap(file: $crate::file::MetaFile<'a>, pos: usize) -> Self {
                Self {
                    header: $crate::meta::MetaHeader::at(file, pos),
                }
            }
        }

        impl<'a> $crate::meta::MetaRecord<'a> for $ty<'a> {
            fn header(&self) -> $crate::meta::MetaHeader<'a> {
                self.header
            }
        }

        impl<'a> From<$crate::meta::MetaHeader<'a>> for $ty<'a> {
            fn from(header: $crate::meta::MetaHeader<'a>) -> Self {
                Self { header }
            }
        }

        impl PartialEq for $ty<'_> {
            fn eq(&self, other: &Self) -> bool {
                self.header == other.header
            }
        }

        impl Eq for $ty<'_> {}

        impl std::hash::Hash for $ty<'_> {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                self.header.hash(state);
            }
        }

        impl std::fmt::Debug for $ty<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("pos", &self.header.position())
                    .field("js_name", &self.header.js_name())
                    .finish()
            }
        }
    };
}

pub(crate) use record_view;

/// A top-level entity from the Global Table, by kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity<'a> {
    /// C struct
    Struct(RecordMeta<'a>),
    /// C union
    Union(RecordMeta<'a>),
    /// C function
    Function(FunctionMeta<'a>),
    /// Inline script source
    JsCode(JsCodeMeta<'a>),
    /// Global variable
    Var(VarMeta<'a>),
    /// Class interface
    Interface(InterfaceMeta<'a>),
    /// Protocol
    Protocol(ProtocolMeta<'a>),
}

impl<'a> Entity<'a> {
    /// Dispatch on the header's kind tag; `None` for the undefined tag
    pub fn from_header(header: MetaHeader<'a>) -> Option<Self> {
        Some(match header.kind()? {
            MetaKind::Struct => Entity::Struct(header.into()),
            MetaKind::Union => Entity::Union(header.into()),
            MetaKind::Function => Entity::Function(header.into()),
            MetaKind::JsCode => Entity::JsCode(header.into()),
            MetaKind::Var => Entity::Var(header.into()),
            MetaKind::Interface => Entity::Interface(InterfaceMeta::from(header)),
            MetaKind::Protocol => Entity::Protocol(ProtocolMeta::from(header)),
        })
    }

    /// The common header
    pub fn header(&self) -> MetaHeader<'a> {
        match self {
            Entity::Struct(m) | Entity::Union(m) => m.header(),
            Entity::Function(m) => m.header(),
            Entity::JsCode(m) => m.header(),
            Entity::Var(m) => m.header(),
            Entity::Interface(m) => m.header(),
            Entity::Protocol(m) => m.header(),
        }
    }

    /// Kind tag
    pub fn kind(&self) -> MetaKind {
        match self {
            Entity::Struct(_) => MetaKind::Struct,
            Entity::Union(_) => MetaKind::Union,
            Entity::Function(_) => MetaKind::Function,
            Entity::JsCode(_) => MetaKind::JsCode,
            Entity::Var(_) => MetaKind::Var,
            Entity::Interface(_) => MetaKind::Interface,
            Entity::Protocol(_) => MetaKind::Protocol,
        }
    }

    /// Name exposed to scripts
    pub fn js_name(&self) -> &'a str {
        self.header().js_name()
    }

    /// Native name
    pub fn name(&self) -> &'a str {
        self.header().name()
    }

    /// Whether the entity exists on the file's system version
    pub fn is_available(&self) -> bool {
        self.header().is_available()
    }

    /// `(major, minor)` the entity was introduced in, if recorded
    pub fn introduced(&self) -> Option<(u8, u8)> {
        let v = self.header().introduced_in();
        (v != 0).then(|| (major_of(v), minor_of(v)))
    }

    /// Struct or union view
    pub fn as_record(&self) -> Option<RecordMeta<'a>> {
        match self {
            Entity::Struct(m) | Entity::Union(m) => Some(*m),
            _ => None,
        }
    }

    /// Function view
    pub fn as_function(&self) -> Option<FunctionMeta<'a>> {
        match self {
            Entity::Function(m) => Some(*m),
            _ => None,
        }
    }

    /// Variable view
    pub fn as_var(&self) -> Option<VarMeta<'a>> {
        match self {
            Entity::Var(m) => Some(*m),
            _ => None,
        }
    }

    /// Script source view
    pub fn as_js_code(&self) -> Option<JsCodeMeta<'a>> {
        match self {
            Entity::JsCode(m) => Some(*m),
            _ => None,
        }
    }

    /// Interface view
    pub fn as_interface(&self) -> Option<InterfaceMeta<'a>> {
        match self {
            Entity::Interface(m) => Some(*m),
            _ => None,
        }
    }

    /// Protocol view
    pub fn as_protocol(&self) -> Option<ProtocolMeta<'a>> {
        match self {
            Entity::Protocol(m) => Some(*m),
            _ => None,
        }
    }

    /// Member-bearing view shared by interfaces and protocols
    pub fn as_base_class(&self) -> Option<BaseClassMeta<'a>> {
        match self {
            Entity::Interface(m) => Some(**m),
            Entity::Protocol(m) => Some(**m),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::SystemVersion;
    use crate::writer::{EncodingDef, MetaDef, MetadataWriter, ModuleDef, VarDef};

    #[test]
    fn test_kind_from_flags() {
        assert_eq!(MetaKind::from_flags(0), None);
        assert_eq!(MetaKind::from_flags(0x80), None);
        assert_eq!(MetaKind::from_flags(6 | 0x80), Some(MetaKind::Interface));
        assert_eq!(MetaKind::from_flags(MetaKind::Protocol.to_u8()), Some(MetaKind::Protocol));
        assert_eq!(MetaKind::JsCode.to_string(), "jscode");
    }

    #[test]
    fn test_header_fields() {
        let mut writer = MetadataWriter::new(2);
        let foundation = writer.add_module(ModuleDef::new("Foundation").framework(true));
        writer.add_var(VarDef::new(
            MetaDef::new("kAlpha")
                .native_name("kCFAlphaNative")
                .module(foundation)
                .introduced(9, 2),
            EncodingDef::int(),
        ));
        writer.add_var(VarDef::new(MetaDef::new("kBeta"), EncodingDef::int()));
        let bytes = writer.finish();
        let file = MetaFile::new(&bytes, SystemVersion::new(9, 1)).unwrap();
        let table = file.global_table();

        let alpha = table.find_meta("kAlpha", false).unwrap();
        let header = alpha.header();
        assert!(header.has_dual_name());
        assert_eq!(header.js_name(), "kAlpha");
        assert_eq!(header.name(), "kCFAlphaNative");
        assert_eq!(header.module().map(|m| m.name()), Some("Foundation"));
        assert_eq!(alpha.introduced(), Some((9, 2)));
        assert!(!alpha.is_available());
        assert!(table.find_meta("kAlpha", true).is_none());

        let beta = table.find_meta("kBeta", true).unwrap();
        assert!(!beta.header().has_dual_name());
        assert_eq!(beta.name(), "kBeta");
        assert!(beta.header().module().is_none());
        assert_eq!(beta.introduced(), None);
    }

    #[test]
    fn test_entity_views_match_kind() {
        let mut writer = MetadataWriter::new(1);
        writer.add_var(VarDef::new(MetaDef::new("kGamma"), EncodingDef::int()));
        let bytes = writer.finish();
        let file = MetaFile::new(&bytes, SystemVersion::LATEST).unwrap();
        let gamma = file.global_table().find_meta("kGamma", false).unwrap();

        assert_eq!(gamma.kind(), MetaKind::Var);
        assert!(gamma.as_var().is_some());
        assert!(gamma.as_function().is_none());
        assert!(gamma.as_record().is_none());
        assert!(gamma.as_base_class().is_none());
        assert_eq!(Entity::from_header(gamma.header()), Some(gamma));
    }
}
