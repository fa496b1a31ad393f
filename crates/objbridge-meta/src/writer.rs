//! Blob writer
//!
//! Lays out definitions into the binary format the views read: records are
//! appended to a heap (strings interned, nested data first, then each
//! header immediately followed by its tail), top-level entities are bucketed
//! by name hash, and [`MetadataWriter::finish`] prefixes the Global Table
//! and the Module Table.
//!
//! # Panics
//!
//! Writing panics when a value does not fit its field: more than 255
//! entries in a `u8`-counted signature, an initializer index beyond
//! `i16::MAX`, or an availability version outside `0.0..=31.7`. It also
//! panics when a class's initializers are not contiguous once its instance
//! methods are sorted by scripting name.

use crate::encoding::EncodingKind;
use crate::hash::name_hash;
use crate::meta::{
    FunctionFlags, LibraryFlags, MetaKind, MethodFlags, ModuleFlags, PropertyFlags, HAS_NAME,
};
use crate::version::encode_version;
use rustc_hash::FxHashMap;

/// Heap byte buffer with string interning
///
/// Offset 0 is reserved so that a zero pointer always reads as null.
pub struct HeapWriter {
    buffer: Vec<u8>,
    strings: FxHashMap<String, i32>,
}

impl HeapWriter {
    /// Create a heap holding only the reserved null byte
    pub fn new() -> Self {
        Self {
            buffer: vec![0],
            strings: FxHashMap::default(),
        }
    }

    /// Heap offset of the next byte written
    pub fn offset(&self) -> i32 {
        self.buffer.len() as i32
    }

    /// Emit a raw byte
    pub fn emit_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Emit a 16-bit signed integer (little-endian)
    pub fn emit_i16(&mut self, value: i16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Emit a 32-bit signed integer (little-endian)
    pub fn emit_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Offset of `s` as a NUL-terminated string, writing it on first use
    pub fn string(&mut self, s: &str) -> i32 {
        if let Some(&offset) = self.strings.get(s) {
            return offset;
        }
        let offset = self.offset();
        self.buffer.extend_from_slice(s.as_bytes());
        self.buffer.push(0);
        self.strings.insert(s.to_string(), offset);
        offset
    }

    /// Write an `i32`-counted array of pointers and return its offset
    pub fn ptr_array(&mut self, ptrs: &[i32]) -> i32 {
        let offset = self.offset();
        self.emit_i32(ptrs.len() as i32);
        for &ptr in ptrs {
            self.emit_i32(ptr);
        }
        offset
    }

    /// Consume the writer and return the heap bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for HeapWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn small_count(len: usize) -> u8 {
    assert!(len <= u8::MAX as usize, "signature of {} entries does not fit a u8 count", len);
    len as u8
}

/// A type encoding to serialize
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingDef {
    /// Payload-free kind (void, int, id, selector, ...)
    Primitive(EncodingKind),
    /// Interface referenced by name
    Interface(String),
    /// Struct referenced by name
    Struct(String),
    /// Union referenced by name
    Union(String),
    /// Pointer to the inner encoding
    Pointer(Box<EncodingDef>),
    /// Fixed-size array
    ConstantArray(i32, Box<EncodingDef>),
    /// Array without a size
    IncompleteArray(Box<EncodingDef>),
    /// SIMD vector
    ExtVector(i32, Box<EncodingDef>),
    /// Block signature, return type first
    Block(Vec<EncodingDef>),
    /// Function pointer signature, return type first
    FunctionPointer(Vec<EncodingDef>),
    /// Inline struct with named fields
    AnonymousStruct(Vec<(String, EncodingDef)>),
    /// Inline union with named fields
    AnonymousUnion(Vec<(String, EncodingDef)>),
}

impl EncodingDef {
    pub fn void() -> Self {
        EncodingDef::Primitive(EncodingKind::Void)
    }

    pub fn bool() -> Self {
        EncodingDef::Primitive(EncodingKind::Bool)
    }

    pub fn int() -> Self {
        EncodingDef::Primitive(EncodingKind::Int)
    }

    pub fn uint() -> Self {
        EncodingDef::Primitive(EncodingKind::UInt)
    }

    pub fn long() -> Self {
        EncodingDef::Primitive(EncodingKind::Long)
    }

    pub fn float() -> Self {
        EncodingDef::Primitive(EncodingKind::Float)
    }

    pub fn double() -> Self {
        EncodingDef::Primitive(EncodingKind::Double)
    }

    pub fn char() -> Self {
        EncodingDef::Primitive(EncodingKind::Char)
    }

    pub fn cstring() -> Self {
        EncodingDef::Primitive(EncodingKind::CString)
    }

    pub fn id() -> Self {
        EncodingDef::Primitive(EncodingKind::Id)
    }

    pub fn selector() -> Self {
        EncodingDef::Primitive(EncodingKind::Selector)
    }

    pub fn instance_type() -> Self {
        EncodingDef::Primitive(EncodingKind::InstanceType)
    }

    pub fn pointer(inner: EncodingDef) -> Self {
        EncodingDef::Pointer(Box::new(inner))
    }

    /// Write every string the encoding references, so that emitting it
    /// afterwards produces one contiguous byte run.
    fn intern(&self, heap: &mut HeapWriter) {
        use EncodingDef::*;
        match self {
            Primitive(_) => {}
            Interface(name) | Struct(name) | Union(name) => {
                heap.string(name);
            }
            Pointer(inner) | ConstantArray(_, inner) | IncompleteArray(inner) | ExtVector(_, inner) => {
                inner.intern(heap)
            }
            Block(signature) | FunctionPointer(signature) => {
                signature.iter().for_each(|d| d.intern(heap))
            }
            AnonymousStruct(fields) | AnonymousUnion(fields) => {
                for (name, def) in fields {
                    heap.string(name);
                    def.intern(heap);
                }
            }
        }
    }

    fn emit(&self, heap: &mut HeapWriter) {
        use EncodingDef::*;
        match self {
            Primitive(kind) => heap.emit_u8(kind.to_u8()),
            Interface(name) => emit_reference(heap, EncodingKind::InterfaceDeclarationReference, name),
            Struct(name) => emit_reference(heap, EncodingKind::StructDeclarationReference, name),
            Union(name) => emit_reference(heap, EncodingKind::UnionDeclarationReference, name),
            Pointer(inner) => {
                heap.emit_u8(EncodingKind::Pointer.to_u8());
                inner.emit(heap);
            }
            ConstantArray(size, inner) | ExtVector(size, inner) => {
                let kind = match self {
                    ConstantArray(..) => EncodingKind::ConstantArray,
                    _ => EncodingKind::ExtVector,
                };
                heap.emit_u8(kind.to_u8());
                heap.emit_i32(*size);
                inner.emit(heap);
            }
            IncompleteArray(inner) => {
                heap.emit_u8(EncodingKind::IncompleteArray.to_u8());
                inner.emit(heap);
            }
            Block(signature) | FunctionPointer(signature) => {
                let kind = match self {
                    Block(_) => EncodingKind::Block,
                    _ => EncodingKind::FunctionPointer,
                };
                heap.emit_u8(kind.to_u8());
                heap.emit_u8(small_count(signature.len()));
                signature.iter().for_each(|d| d.emit(heap));
            }
            AnonymousStruct(fields) | AnonymousUnion(fields) => {
                let kind = match self {
                    AnonymousStruct(_) => EncodingKind::AnonymousStruct,
                    _ => EncodingKind::AnonymousUnion,
                };
                heap.emit_u8(kind.to_u8());
                heap.emit_u8(small_count(fields.len()));
                for (name, _) in fields {
                    let ptr = heap.string(name);
                    heap.emit_i32(ptr);
                }
                for (_, def) in fields {
                    def.emit(heap);
                }
            }
        }
    }
}

fn emit_reference(heap: &mut HeapWriter, kind: EncodingKind, name: &str) {
    heap.emit_u8(kind.to_u8());
    let ptr = heap.string(name);
    heap.emit_i32(ptr);
}

/// Handle to a written module, used to attribute entities to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleRef(i32);

/// Handle to a written top-level record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRef(i32);

impl EntryRef {
    /// Heap offset of the record header
    pub fn offset(self) -> i32 {
        self.0
    }
}

/// Header fields shared by every record
#[derive(Debug, Clone)]
pub struct MetaDef {
    js_name: String,
    name: Option<String>,
    module: Option<ModuleRef>,
    introduced: u8,
}

impl MetaDef {
    pub fn new(js_name: &str) -> Self {
        Self {
            js_name: js_name.to_string(),
            name: None,
            module: None,
            introduced: 0,
        }
    }

    /// Native name, when it differs from the scripting name
    pub fn native_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn module(mut self, module: ModuleRef) -> Self {
        self.module = Some(module);
        self
    }

    /// Introduced-in version. The one-byte encoding holds majors up to 31
    /// and minors up to 7.
    pub fn introduced(mut self, major: u8, minor: u8) -> Self {
        assert!(
            major < 32 && minor < 8,
            "version {}.{} does not fit the availability encoding",
            major,
            minor
        );
        self.introduced = encode_version(major, minor);
        self
    }
}

/// A struct or union
#[derive(Debug, Clone)]
pub struct RecordDef {
    meta: MetaDef,
    field_names: Vec<String>,
    field_encodings: Vec<EncodingDef>,
}

impl RecordDef {
    pub fn new(meta: MetaDef) -> Self {
        Self {
            meta,
            field_names: Vec::new(),
            field_encodings: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, encoding: EncodingDef) -> Self {
        self.field_names.push(name.to_string());
        self.field_encodings.push(encoding);
        self
    }
}

/// A C function; the signature starts with the return type
#[derive(Debug, Clone)]
pub struct FunctionDef {
    meta: MetaDef,
    signature: Vec<EncodingDef>,
    flags: FunctionFlags,
}

impl FunctionDef {
    pub fn new(meta: MetaDef, signature: Vec<EncodingDef>) -> Self {
        Self {
            meta,
            signature,
            flags: FunctionFlags::default(),
        }
    }

    pub fn flags(mut self, flags: FunctionFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// A global variable
#[derive(Debug, Clone)]
pub struct VarDef {
    meta: MetaDef,
    encoding: EncodingDef,
}

impl VarDef {
    pub fn new(meta: MetaDef, encoding: EncodingDef) -> Self {
        Self { meta, encoding }
    }
}

/// Inline script source
#[derive(Debug, Clone)]
pub struct JsCodeDef {
    meta: MetaDef,
    code: String,
}

impl JsCodeDef {
    pub fn new(meta: MetaDef, code: &str) -> Self {
        Self {
            meta,
            code: code.to_string(),
        }
    }
}

/// A method; the signature starts with the return type
#[derive(Debug, Clone)]
pub struct MethodDef {
    meta: MetaDef,
    signature: Vec<EncodingDef>,
    flags: MethodFlags,
    constructor_tokens: Option<String>,
}

impl MethodDef {
    /// Method exposed as `js_name` with native selector `selector`
    pub fn new(js_name: &str, selector: &str, signature: Vec<EncodingDef>) -> Self {
        Self {
            meta: MetaDef::new(js_name).native_name(selector),
            signature,
            flags: MethodFlags::default(),
            constructor_tokens: None,
        }
    }

    pub fn flags(mut self, flags: MethodFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Mark as a member of the init family
    pub fn initializer(mut self) -> Self {
        self.flags.initializer = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.flags.optional = true;
        self
    }

    pub fn introduced(mut self, major: u8, minor: u8) -> Self {
        self.meta = self.meta.introduced(major, minor);
        self
    }

    pub fn constructor_tokens(mut self, tokens: &str) -> Self {
        self.constructor_tokens = Some(tokens.to_string());
        self
    }
}

/// A property with optional getter and setter
#[derive(Debug, Clone)]
pub struct PropertyDef {
    meta: MetaDef,
    optional: bool,
    getter: Option<MethodDef>,
    setter: Option<MethodDef>,
}

impl PropertyDef {
    pub fn new(js_name: &str) -> Self {
        Self {
            meta: MetaDef::new(js_name),
            optional: false,
            getter: None,
            setter: None,
        }
    }

    pub fn getter(mut self, getter: MethodDef) -> Self {
        self.getter = Some(getter);
        self
    }

    pub fn setter(mut self, setter: MethodDef) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn introduced(mut self, major: u8, minor: u8) -> Self {
        self.meta = self.meta.introduced(major, minor);
        self
    }
}

/// An interface or a protocol
#[derive(Debug, Clone)]
pub struct ClassDef {
    meta: MetaDef,
    base: Option<String>,
    protocols: Vec<String>,
    instance_methods: Vec<MethodDef>,
    static_methods: Vec<MethodDef>,
    instance_properties: Vec<PropertyDef>,
    static_properties: Vec<PropertyDef>,
}

impl ClassDef {
    pub fn new(meta: MetaDef) -> Self {
        Self {
            meta,
            base: None,
            protocols: Vec::new(),
            instance_methods: Vec::new(),
            static_methods: Vec::new(),
            instance_properties: Vec::new(),
            static_properties: Vec::new(),
        }
    }

    /// Base class name; ignored for protocols
    pub fn base(mut self, name: &str) -> Self {
        self.base = Some(name.to_string());
        self
    }

    /// Adopt a protocol, in declaration order
    pub fn protocol(mut self, name: &str) -> Self {
        self.protocols.push(name.to_string());
        self
    }

    /// Add an instance method. Instance methods are stored sorted by
    /// scripting name and readers find initializers as one run starting at
    /// the first of them, so initializer names must sort next to each other.
    pub fn instance_method(mut self, method: MethodDef) -> Self {
        self.instance_methods.push(method);
        self
    }

    pub fn static_method(mut self, method: MethodDef) -> Self {
        self.static_methods.push(method);
        self
    }

    pub fn instance_property(mut self, property: PropertyDef) -> Self {
        self.instance_properties.push(property);
        self
    }

    pub fn static_property(mut self, property: PropertyDef) -> Self {
        self.static_properties.push(property);
        self
    }
}

/// A linked library
#[derive(Debug, Clone)]
pub struct LibraryDef {
    name: String,
    flags: LibraryFlags,
}

impl LibraryDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            flags: LibraryFlags::default(),
        }
    }

    pub fn framework(mut self, framework: bool) -> Self {
        self.flags.framework = framework;
        self
    }
}

/// A top-level module
#[derive(Debug, Clone)]
pub struct ModuleDef {
    name: String,
    flags: ModuleFlags,
    libraries: Vec<LibraryDef>,
}

impl ModuleDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            flags: ModuleFlags::default(),
            libraries: Vec::new(),
        }
    }

    pub fn framework(mut self, framework: bool) -> Self {
        self.flags.framework = framework;
        self
    }

    pub fn system(mut self, system: bool) -> Self {
        self.flags.system = system;
        self
    }

    pub fn library(mut self, library: LibraryDef) -> Self {
        self.libraries.push(library);
        self
    }
}

/// Builds a complete metadata blob
pub struct MetadataWriter {
    heap: HeapWriter,
    bucket_count: usize,
    entries: Vec<(String, i32)>,
    modules: Vec<i32>,
}

impl MetadataWriter {
    /// Create a writer whose Global Table will have `bucket_count` buckets
    pub fn new(bucket_count: usize) -> Self {
        Self {
            heap: HeapWriter::new(),
            bucket_count,
            entries: Vec::new(),
            modules: Vec::new(),
        }
    }

    /// Write a module and its libraries and list it in the Module Table
    pub fn add_module(&mut self, def: ModuleDef) -> ModuleRef {
        let mut libraries = Vec::with_capacity(def.libraries.len());
        for library in &def.libraries {
            let name = self.heap.string(&library.name);
            libraries.push(self.heap.offset());
            self.heap.emit_u8(library.flags.to_bits());
            self.heap.emit_i32(name);
        }
        let libraries = if libraries.is_empty() {
            0
        } else {
            self.heap.ptr_array(&libraries)
        };
        let name = self.heap.string(&def.name);

        let offset = self.heap.offset();
        self.heap.emit_u8(def.flags.to_bits());
        self.heap.emit_i32(name);
        self.heap.emit_i32(libraries);
        self.modules.push(offset);
        ModuleRef(offset)
    }

    pub fn add_struct(&mut self, def: RecordDef) -> EntryRef {
        self.add_record(def, MetaKind::Struct)
    }

    pub fn add_union(&mut self, def: RecordDef) -> EntryRef {
        self.add_record(def, MetaKind::Union)
    }

    fn add_record(&mut self, def: RecordDef, kind: MetaKind) -> EntryRef {
        let names: Vec<i32> = def.field_names.iter().map(|n| self.heap.string(n)).collect();
        let names = self.heap.ptr_array(&names);
        let encodings = self.encoding_list(&def.field_encodings);

        let offset = self.write_header(&def.meta, kind.to_u8());
        self.heap.emit_i32(names);
        self.heap.emit_i32(encodings);
        self.register(&def.meta, offset)
    }

    pub fn add_function(&mut self, def: FunctionDef) -> EntryRef {
        let encodings = self.encoding_list(&def.signature);
        let flags = MetaKind::Function.to_u8() | def.flags.to_bits();
        let offset = self.write_header(&def.meta, flags);
        self.heap.emit_i32(encodings);
        self.register(&def.meta, offset)
    }

    pub fn add_var(&mut self, def: VarDef) -> EntryRef {
        def.encoding.intern(&mut self.heap);
        let encoding = self.heap.offset();
        def.encoding.emit(&mut self.heap);

        let offset = self.write_header(&def.meta, MetaKind::Var.to_u8());
        self.heap.emit_i32(encoding);
        self.register(&def.meta, offset)
    }

    pub fn add_js_code(&mut self, def: JsCodeDef) -> EntryRef {
        let code = self.heap.string(&def.code);
        let offset = self.write_header(&def.meta, MetaKind::JsCode.to_u8());
        self.heap.emit_i32(code);
        self.register(&def.meta, offset)
    }

    pub fn add_interface(&mut self, def: ClassDef) -> EntryRef {
        self.add_class(def, MetaKind::Interface)
    }

    pub fn add_protocol(&mut self, def: ClassDef) -> EntryRef {
        self.add_class(def, MetaKind::Protocol)
    }

    fn add_class(&mut self, mut def: ClassDef, kind: MetaKind) -> EntryRef {
        by_js_name(&mut def.instance_methods, |m| &m.meta);
        by_js_name(&mut def.static_methods, |m| &m.meta);
        by_js_name(&mut def.instance_properties, |p| &p.meta);
        by_js_name(&mut def.static_properties, |p| &p.meta);

        let instance_methods = self.methods(&def.instance_methods);
        let static_methods = self.methods(&def.static_methods);
        let instance_properties = self.properties(&def.instance_properties);
        let static_properties = self.properties(&def.static_properties);
        let protocols: Vec<i32> = def.protocols.iter().map(|p| self.heap.string(p)).collect();
        let protocols = if protocols.is_empty() {
            0
        } else {
            self.heap.ptr_array(&protocols)
        };
        let initializers_start = match def.instance_methods.iter().position(|m| m.flags.initializer) {
            Some(index) => {
                assert!(index <= i16::MAX as usize, "initializer index {} out of range", index);
                let run = def.instance_methods[index..]
                    .iter()
                    .take_while(|m| m.flags.initializer)
                    .count();
                let total = def.instance_methods.iter().filter(|m| m.flags.initializer).count();
                assert!(
                    run == total,
                    "initializers of {} are not contiguous by name",
                    def.meta.js_name
                );
                index as i16
            }
            None => -1,
        };
        let base = match (&def.base, kind) {
            (Some(base), MetaKind::Interface) => self.heap.string(base),
            _ => 0,
        };

        let offset = self.write_header(&def.meta, kind.to_u8());
        self.heap.emit_i32(instance_methods);
        self.heap.emit_i32(static_methods);
        self.heap.emit_i32(instance_properties);
        self.heap.emit_i32(static_properties);
        self.heap.emit_i32(protocols);
        self.heap.emit_i16(initializers_start);
        if kind == MetaKind::Interface {
            self.heap.emit_i32(base);
        }
        self.register(&def.meta, offset)
    }

    fn methods(&mut self, defs: &[MethodDef]) -> i32 {
        if defs.is_empty() {
            return 0;
        }
        let records: Vec<i32> = defs.iter().map(|m| self.method(m)).collect();
        self.heap.ptr_array(&records)
    }

    fn method(&mut self, def: &MethodDef) -> i32 {
        let encodings = self.encoding_list(&def.signature);
        let tokens = def
            .constructor_tokens
            .as_deref()
            .map_or(0, |t| self.heap.string(t));
        let offset = self.write_header(&def.meta, def.flags.to_bits());
        self.heap.emit_i32(encodings);
        self.heap.emit_i32(tokens);
        offset
    }

    fn properties(&mut self, defs: &[PropertyDef]) -> i32 {
        if defs.is_empty() {
            return 0;
        }
        let records: Vec<i32> = defs.iter().map(|p| self.property(p)).collect();
        self.heap.ptr_array(&records)
    }

    fn property(&mut self, def: &PropertyDef) -> i32 {
        let getter = def.getter.as_ref().map(|m| self.method(m));
        let setter = def.setter.as_ref().map(|m| self.method(m));
        let flags = PropertyFlags {
            optional: def.optional,
            has_getter: getter.is_some(),
            has_setter: setter.is_some(),
        };
        // The setter takes the first slot when there is no getter.
        let (first, second) = match (getter, setter) {
            (Some(g), Some(s)) => (g, s),
            (Some(g), None) => (g, 0),
            (None, Some(s)) => (s, 0),
            (None, None) => (0, 0),
        };
        let offset = self.write_header(&def.meta, flags.to_bits());
        self.heap.emit_i32(first);
        self.heap.emit_i32(second);
        offset
    }

    /// Write `defs` as an `i32`-counted encoding list and return its offset
    pub fn encoding_list(&mut self, defs: &[EncodingDef]) -> i32 {
        defs.iter().for_each(|d| d.intern(&mut self.heap));
        let offset = self.heap.offset();
        self.heap.emit_i32(defs.len() as i32);
        defs.iter().for_each(|d| d.emit(&mut self.heap));
        offset
    }

    fn write_header(&mut self, meta: &MetaDef, flags: u8) -> i32 {
        let js_name = self.heap.string(&meta.js_name);
        let (names, flags) = match &meta.name {
            Some(name) if *name != meta.js_name => {
                let name = self.heap.string(name);
                let pair = self.heap.offset();
                self.heap.emit_i32(js_name);
                self.heap.emit_i32(name);
                (pair, flags | (1 << HAS_NAME))
            }
            _ => (js_name, flags),
        };

        let offset = self.heap.offset();
        self.heap.emit_i32(names);
        self.heap.emit_i32(meta.module.map_or(0, |m| m.0));
        self.heap.emit_u8(flags);
        self.heap.emit_u8(meta.introduced);
        offset
    }

    fn register(&mut self, meta: &MetaDef, offset: i32) -> EntryRef {
        self.entries.push((meta.js_name.clone(), offset));
        EntryRef(offset)
    }

    /// Bucket the registered entities and assemble the blob.
    ///
    /// # Panics
    ///
    /// Panics if entities were added to a writer with zero buckets.
    pub fn finish(mut self) -> Vec<u8> {
        let bucket_count = self.bucket_count;
        assert!(
            bucket_count > 0 || self.entries.is_empty(),
            "{} entities need at least one bucket",
            self.entries.len()
        );

        let mut buckets: Vec<Vec<(String, i32)>> = vec![Vec::new(); bucket_count];
        for (name, offset) in std::mem::take(&mut self.entries) {
            let index = name_hash(name.as_bytes()) as usize % bucket_count;
            buckets[index].push((name, offset));
        }
        let mut bucket_ptrs = Vec::with_capacity(bucket_count);
        for bucket in &mut buckets {
            if bucket.is_empty() {
                bucket_ptrs.push(0);
                continue;
            }
            bucket.sort_by(|a, b| a.0.cmp(&b.0));
            let records: Vec<i32> = bucket.iter().map(|(_, offset)| *offset).collect();
            bucket_ptrs.push(self.heap.ptr_array(&records));
        }

        let heap = self.heap.into_bytes();
        let mut blob = Vec::with_capacity(8 + 4 * (bucket_count + self.modules.len()) + heap.len());
        blob.extend_from_slice(&(bucket_count as i32).to_le_bytes());
        for ptr in &bucket_ptrs {
            blob.extend_from_slice(&ptr.to_le_bytes());
        }
        blob.extend_from_slice(&(self.modules.len() as i32).to_le_bytes());
        for ptr in &self.modules {
            blob.extend_from_slice(&ptr.to_le_bytes());
        }
        blob.extend_from_slice(&heap);

        log::debug!(
            "wrote metadata blob: {} bytes, {} buckets ({} used), {} modules",
            blob.len(),
            bucket_count,
            bucket_ptrs.iter().filter(|&&p| p != 0).count(),
            self.modules.len()
        );
        blob
    }
}

/// Stable sort by scripting name, the order member lookups binary-search.
fn by_js_name<T>(defs: &mut [T], meta: impl Fn(&T) -> &MetaDef) {
    defs.sort_by(|a, b| meta(a).js_name.cmp(&meta(b).js_name));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_reserves_null_and_interns() {
        let mut heap = HeapWriter::new();
        assert_eq!(heap.offset(), 1);
        let a = heap.string("init");
        let b = heap.string("alloc");
        assert_eq!(heap.string("init"), a);
        assert_eq!(a, 1);
        assert_eq!(b, 6);
        assert_eq!(heap.into_bytes(), b"\0init\0alloc\0");
    }

    #[test]
    fn test_header_layout() {
        let mut writer = MetadataWriter::new(1);
        let entry = writer.add_js_code(JsCodeDef::new(MetaDef::new("x").introduced(9, 2), "1"));
        let blob = writer.finish();

        // bucket count + 1 bucket ptr + module count
        let heap_base = 12;
        let header = heap_base + entry.offset() as usize;
        assert_eq!(blob[header + 8], MetaKind::JsCode.to_u8());
        assert_eq!(blob[header + 9], encode_version(9, 2));
    }

    #[test]
    fn test_dual_name_sets_flag() {
        let mut writer = MetadataWriter::new(1);
        let same = writer.add_var(VarDef::new(MetaDef::new("kA").native_name("kA"), EncodingDef::int()));
        let dual = writer.add_var(VarDef::new(MetaDef::new("kB").native_name("kBNative"), EncodingDef::int()));
        let blob = writer.finish();
        let flags = |e: EntryRef| blob[12 + e.offset() as usize + 8];
        assert_eq!(flags(same) & (1 << HAS_NAME), 0);
        assert_ne!(flags(dual) & (1 << HAS_NAME), 0);
    }

    #[test]
    #[should_panic(expected = "need at least one bucket")]
    fn test_zero_buckets_with_entities_panics() {
        let mut writer = MetadataWriter::new(0);
        writer.add_js_code(JsCodeDef::new(MetaDef::new("x"), ""));
        writer.finish();
    }

    #[test]
    #[should_panic(expected = "not contiguous")]
    fn test_interleaved_initializers_panic() {
        let mut writer = MetadataWriter::new(1);
        writer.add_interface(
            ClassDef::new(MetaDef::new("NSThing"))
                .instance_method(MethodDef::new("init", "init", vec![EncodingDef::instance_type()]).initializer())
                .instance_method(MethodDef::new("initHelper", "initHelper", vec![EncodingDef::void()]))
                .instance_method(
                    MethodDef::new("initWithA", "initWithA:", vec![EncodingDef::instance_type(), EncodingDef::id()])
                        .initializer(),
                ),
        );
    }

    #[test]
    #[should_panic(expected = "does not fit the availability encoding")]
    fn test_version_beyond_encoding_panics() {
        // 32.0 would wrap to 0, which reads as "always available".
        let _ = MetaDef::new("x").introduced(32, 0);
    }
}
