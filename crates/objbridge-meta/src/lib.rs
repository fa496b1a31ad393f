//! Objbridge metadata engine
//!
//! Read-only, zero-copy views over the binary metadata blob that describes a
//! native API surface (interfaces, protocols, structs, unions, functions,
//! variables, methods and properties). Every view is a position into the
//! blob; nothing is deserialized onto the heap.
//!
//! The blob is laid out as a Global Table (name-hash buckets), a Module
//! Table and a heap of variable-length records addressed by 32-bit offsets
//! from the heap base. Open one with [`MetaFile::new`] and query it through
//! [`MetaFile::global_table`].

#![warn(rust_2018_idioms)]

pub mod encoding;
pub mod error;
pub mod file;
pub mod hash;
pub mod heap;
pub mod meta;
pub mod runtime;
pub mod table;
pub mod version;
pub mod writer;

pub use encoding::{EncodingDetails, EncodingKind, EncodingList, TypeEncoding};
pub use error::MetaError;
pub use file::{install, instance, MetaFile};
pub use hash::name_hash;
pub use heap::{Array, RelPtr};
pub use meta::{
    select_overload, Ancestors, BaseClassMeta, Entity, FunctionFlags, FunctionMeta, InterfaceMeta,
    JsCodeMeta, LibraryMeta, MemberKind, MemberMeta, MembersCollection, MetaHeader, MetaKind,
    MetaRecord, MethodFlags, MethodMeta, ModuleFlags, ModuleMeta, PropertyFlags, PropertyMeta,
    ProtocolMeta, RecordMeta, VarMeta,
};
pub use runtime::{AssumeImplemented, ClassRuntime};
pub use table::GlobalTable;
pub use version::{encode_version, major_of, minor_of, SystemVersion};
