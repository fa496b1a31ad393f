//! Binary type encodings
//!
//! A type encoding is one kind byte followed by a kind-dependent payload.
//! Composite kinds nest further encodings inline, so a list of encodings is
//! a flat byte stream walked with [`TypeEncoding::next`].

use crate::file::MetaFile;
use crate::heap::{read_i32, read_u8, FromHeap, RelPtr, PTR_SIZE};
use std::fmt;

/// Kind byte of a type encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EncodingKind {
    /// void
    Void = 0,
    /// bool
    Bool = 1,
    /// short
    Short = 2,
    /// unsigned short
    UShort = 3,
    /// int
    Int = 4,
    /// unsigned int
    UInt = 5,
    /// long
    Long = 6,
    /// unsigned long
    ULong = 7,
    /// long long
    LongLong = 8,
    /// unsigned long long
    ULongLong = 9,
    /// char
    Char = 10,
    /// unsigned char
    UChar = 11,
    /// 16-bit unicode character
    Unichar = 12,
    /// signed char
    CharS = 13,
    /// NUL-terminated C string
    CString = 14,
    /// float
    Float = 15,
    /// double
    Double = 16,
    /// Interface referenced by name
    InterfaceDeclarationReference = 17,
    /// Struct referenced by name
    StructDeclarationReference = 18,
    /// Union referenced by name
    UnionDeclarationReference = 19,
    /// Pointer to the inner encoding
    Pointer = 20,
    /// va_list
    VaList = 21,
    /// Selector
    Selector = 22,
    /// Class object
    Class = 23,
    /// Protocol object
    Protocol = 24,
    /// instancetype
    InstanceType = 25,
    /// id
    Id = 26,
    /// Fixed-size array
    ConstantArray = 27,
    /// Array of unknown size
    IncompleteArray = 28,
    /// C function pointer
    FunctionPointer = 29,
    /// Block
    Block = 30,
    /// Inline anonymous struct
    AnonymousStruct = 31,
    /// Inline anonymous union
    AnonymousUnion = 32,
    /// Extended vector
    ExtVector = 33,
}

impl EncodingKind {
    /// Decode a kind byte
    pub fn from_u8(byte: u8) -> Option<Self> {
        use EncodingKind::*;
        Some(match byte {
            0 => Void,
            1 => Bool,
            2 => Short,
            3 => UShort,
            4 => Int,
            5 => UInt,
            6 => Long,
            7 => ULong,
            8 => LongLong,
            9 => ULongLong,
            10 => Char,
            11 => UChar,
            12 => Unichar,
            13 => CharS,
            14 => CString,
            15 => Float,
            16 => Double,
            17 => InterfaceDeclarationReference,
            18 => StructDeclarationReference,
            19 => UnionDeclarationReference,
            20 => Pointer,
            21 => VaList,
            22 => Selector,
            23 => Class,
            24 => Protocol,
            25 => InstanceType,
            26 => Id,
            27 => ConstantArray,
            28 => IncompleteArray,
            29 => FunctionPointer,
            30 => Block,
            31 => AnonymousStruct,
            32 => AnonymousUnion,
            33 => ExtVector,
            _ => return None,
        })
    }

    /// Encode to the kind byte
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Whether the payload is empty (the encoding is exactly one byte)
    pub fn is_fixed_size(self) -> bool {
        use EncodingKind::*;
        !matches!(
            self,
            InterfaceDeclarationReference
                | StructDeclarationReference
                | UnionDeclarationReference
                | Pointer
                | ConstantArray
                | IncompleteArray
                | FunctionPointer
                | Block
                | AnonymousStruct
                | AnonymousUnion
                | ExtVector
        )
    }

    /// Spelling used when rendering encodings
    pub fn name(self) -> &'static str {
        use EncodingKind::*;
        match self {
            Void => "void",
            Bool => "bool",
            Short => "short",
            UShort => "unsigned short",
            Int => "int",
            UInt => "unsigned int",
            Long => "long",
            ULong => "unsigned long",
            LongLong => "long long",
            ULongLong => "unsigned long long",
            Char => "char",
            UChar => "unsigned char",
            Unichar => "unichar",
            CharS => "signed char",
            CString => "char*",
            Float => "float",
            Double => "double",
            InterfaceDeclarationReference => "interface",
            StructDeclarationReference => "struct",
            UnionDeclarationReference => "union",
            Pointer => "pointer",
            VaList => "va_list",
            Selector => "SEL",
            Class => "Class",
            Protocol => "Protocol",
            InstanceType => "instancetype",
            Id => "id",
            ConstantArray => "array",
            IncompleteArray => "array",
            FunctionPointer => "function",
            Block => "block",
            AnonymousStruct => "struct",
            AnonymousUnion => "union",
            ExtVector => "vector",
        }
    }
}

/// View of one type encoding inside the blob
#[derive(Clone, Copy)]
pub struct TypeEncoding<'a> {
    file: MetaFile<'a>,
    pos: usize,
}

impl<'a> TypeEncoding<'a> {
    /// View the encoding starting at absolute position `pos`
    pub fn at(file: MetaFile<'a>, pos: usize) -> Self {
        Self { file, pos }
    }

    /// Absolute position of the kind byte
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Raw kind byte
    pub fn tag(&self) -> u8 {
        read_u8(self.file.blob(), self.pos)
    }

    /// Decoded kind, `None` for an unknown tag
    pub fn kind(&self) -> Option<EncodingKind> {
        EncodingKind::from_u8(self.tag())
    }

    fn payload(&self) -> usize {
        self.pos + 1
    }

    /// The encoding serialized immediately after this one.
    ///
    /// Walks nested encodings (array elements, pointees, block and function
    /// pointer signatures, anonymous record fields) to find where this one
    /// ends. Unknown tags are treated as payload-free.
    pub fn next(&self) -> TypeEncoding<'a> {
        use EncodingKind::*;
        let end = match self.kind() {
            Some(ConstantArray | ExtVector) => {
                TypeEncoding::at(self.file, self.payload() + 4).next().pos
            }
            Some(IncompleteArray | Pointer) => TypeEncoding::at(self.file, self.payload()).next().pos,
            Some(Block | FunctionPointer) => self.signature().end(),
            Some(
                InterfaceDeclarationReference
                | StructDeclarationReference
                | UnionDeclarationReference,
            ) => self.payload() + PTR_SIZE,
            Some(AnonymousStruct | AnonymousUnion) => self.anonymous_record().fields().end(),
            _ => self.payload(),
        };
        TypeEncoding::at(self.file, end)
    }

    /// Encoded size in bytes, including nested encodings
    pub fn size_in_bytes(&self) -> usize {
        self.next().pos - self.pos
    }

    fn signature(&self) -> EncodingList<'a> {
        EncodingList::with_u8_count(self.file, self.payload())
    }

    fn anonymous_record(&self) -> AnonymousRecord<'a> {
        AnonymousRecord {
            file: self.file,
            pos: self.payload(),
        }
    }

    /// Structured view of the payload
    pub fn details(&self) -> EncodingDetails<'a> {
        use EncodingKind::*;
        let Some(kind) = self.kind() else {
            return EncodingDetails::Unknown(self.tag());
        };
        match kind {
            InterfaceDeclarationReference | StructDeclarationReference | UnionDeclarationReference => {
                let name = RelPtr::<&'a str>::read(self.file.blob(), self.payload())
                    .value(self.file)
                    .unwrap_or("");
                EncodingDetails::DeclarationReference { kind, name }
            }
            Pointer => EncodingDetails::Pointer(TypeEncoding::at(self.file, self.payload())),
            IncompleteArray => {
                EncodingDetails::IncompleteArray(TypeEncoding::at(self.file, self.payload()))
            }
            ConstantArray | ExtVector => {
                let size = read_i32(self.file.blob(), self.payload());
                let element = TypeEncoding::at(self.file, self.payload() + 4);
                if kind == ConstantArray {
                    EncodingDetails::ConstantArray { size, element }
                } else {
                    EncodingDetails::ExtVector { size, element }
                }
            }
            Block => EncodingDetails::Block(self.signature()),
            FunctionPointer => EncodingDetails::FunctionPointer(self.signature()),
            AnonymousStruct | AnonymousUnion => EncodingDetails::AnonymousRecord {
                kind,
                record: self.anonymous_record(),
            },
            primitive => EncodingDetails::Primitive(primitive),
        }
    }
}

impl<'a> FromHeap<'a> for TypeEncoding<'a> {
    fn from_heap(file: MetaFile<'a>, pos: usize) -> Self {
        TypeEncoding::at(file, pos)
    }
}

impl fmt::Debug for TypeEncoding<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeEncoding@{}({})", self.pos, self)
    }
}

impl fmt::Display for TypeEncoding<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.details() {
            EncodingDetails::Primitive(kind) => f.write_str(kind.name()),
            EncodingDetails::DeclarationReference { kind, name } => match kind {
                EncodingKind::InterfaceDeclarationReference => write!(f, "{}*", name),
                _ => write!(f, "{} {}", kind.name(), name),
            },
            EncodingDetails::Pointer(inner) => write!(f, "{}*", inner),
            EncodingDetails::IncompleteArray(element) => write!(f, "{}[]", element),
            EncodingDetails::ConstantArray { size, element } => write!(f, "{}[{}]", element, size),
            EncodingDetails::ExtVector { size, element } => write!(f, "vector<{}, {}>", element, size),
            EncodingDetails::Block(signature) => write!(f, "block{}", signature),
            EncodingDetails::FunctionPointer(signature) => write!(f, "function{}", signature),
            EncodingDetails::AnonymousRecord { kind, record } => {
                write!(f, "{} {{", kind.name())?;
                for (name, field) in record.iter() {
                    write!(f, " {} {};", field, name)?;
                }
                f.write_str(" }")
            }
            EncodingDetails::Unknown(tag) => write!(f, "<unknown {}>", tag),
        }
    }
}

/// Structured payload of a [`TypeEncoding`]
#[derive(Debug, Clone, Copy)]
pub enum EncodingDetails<'a> {
    /// Payload-free kinds
    Primitive(EncodingKind),
    /// Interface, struct or union named elsewhere in the metadata
    DeclarationReference {
        /// One of the three declaration reference kinds
        kind: EncodingKind,
        /// Name of the referenced declaration
        name: &'a str,
    },
    /// Pointer to `inner`
    Pointer(TypeEncoding<'a>),
    /// Array of unknown size
    IncompleteArray(TypeEncoding<'a>),
    /// Array of `size` elements
    ConstantArray {
        /// Element count
        size: i32,
        /// Element encoding
        element: TypeEncoding<'a>,
    },
    /// Extended vector of `size` elements
    ExtVector {
        /// Element count
        size: i32,
        /// Element encoding
        element: TypeEncoding<'a>,
    },
    /// Block signature, return type first
    Block(EncodingList<'a>),
    /// Function pointer signature, return type first
    FunctionPointer(EncodingList<'a>),
    /// Inline anonymous struct or union
    AnonymousRecord {
        /// `AnonymousStruct` or `AnonymousUnion`
        kind: EncodingKind,
        /// Field names and encodings
        record: AnonymousRecord<'a>,
    },
    /// Tag outside the known range
    Unknown(u8),
}

/// Count-prefixed run of back-to-back encodings
#[derive(Clone, Copy)]
pub struct EncodingList<'a> {
    file: MetaFile<'a>,
    first: usize,
    count: usize,
}

impl<'a> EncodingList<'a> {
    /// List with an `i32` count prefix at `pos` (records and signatures of
    /// functions and methods)
    pub fn with_i32_count(file: MetaFile<'a>, pos: usize) -> Self {
        Self {
            file,
            first: pos + 4,
            count: read_i32(file.blob(), pos).max(0) as usize,
        }
    }

    /// List with a `u8` count prefix at `pos` (block and function pointer
    /// signatures)
    pub fn with_u8_count(file: MetaFile<'a>, pos: usize) -> Self {
        Self {
            file,
            first: pos + 1,
            count: read_u8(file.blob(), pos) as usize,
        }
    }

    pub(crate) fn empty(file: MetaFile<'a>) -> Self {
        Self {
            file,
            first: 0,
            count: 0,
        }
    }

    /// Number of encodings
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the list holds no encodings
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// First encoding, if any
    pub fn first(&self) -> Option<TypeEncoding<'a>> {
        (self.count > 0).then(|| TypeEncoding::at(self.file, self.first))
    }

    /// Encoding at `index` (linear walk)
    pub fn get(&self, index: usize) -> Option<TypeEncoding<'a>> {
        self.iter().nth(index)
    }

    /// Iterate in stored order
    pub fn iter(&self) -> EncodingIter<'a> {
        EncodingIter {
            current: TypeEncoding::at(self.file, self.first),
            remaining: self.count,
        }
    }

    /// Position right after the last encoding
    pub fn end(&self) -> usize {
        let mut current = TypeEncoding::at(self.file, self.first);
        for _ in 0..self.count {
            current = current.next();
        }
        current.pos
    }
}

impl fmt::Debug for EncodingList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Renders as `(ret, p1, p2)`
impl fmt::Display for EncodingList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, encoding) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", encoding)?;
        }
        f.write_str(")")
    }
}

impl<'a> IntoIterator for EncodingList<'a> {
    type Item = TypeEncoding<'a>;
    type IntoIter = EncodingIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over an [`EncodingList`]
pub struct EncodingIter<'a> {
    current: TypeEncoding<'a>,
    remaining: usize,
}

impl<'a> Iterator for EncodingIter<'a> {
    type Item = TypeEncoding<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.current;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.current = item.next();
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EncodingIter<'_> {}

/// Payload of an anonymous struct or union: `u8` field count, that many
/// name pointers, then that many field encodings.
#[derive(Clone, Copy)]
pub struct AnonymousRecord<'a> {
    file: MetaFile<'a>,
    pos: usize,
}

impl<'a> AnonymousRecord<'a> {
    /// Number of fields
    pub fn field_count(&self) -> usize {
        read_u8(self.file.blob(), self.pos) as usize
    }

    /// Name of field `index`
    pub fn field_name(&self, index: usize) -> Option<&'a str> {
        if index >= self.field_count() {
            return None;
        }
        RelPtr::<&'a str>::read(self.file.blob(), self.pos + 1 + index * PTR_SIZE).value(self.file)
    }

    /// Field encodings in declaration order
    pub fn fields(&self) -> EncodingList<'a> {
        let count = self.field_count();
        EncodingList {
            file: self.file,
            first: self.pos + 1 + count * PTR_SIZE,
            count,
        }
    }

    /// `(name, encoding)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, TypeEncoding<'a>)> + 'a {
        let record = *self;
        (0..self.field_count())
            .map(move |i| record.field_name(i).unwrap_or(""))
            .zip(self.fields().iter())
    }
}

impl fmt::Debug for AnonymousRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
