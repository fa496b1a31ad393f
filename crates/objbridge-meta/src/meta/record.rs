//! Struct/union, function, variable and script-source records

use super::flags::FunctionFlags;
use super::{record_view, MetaHeader};
use crate::encoding::{EncodingList, TypeEncoding};
use crate::heap::{Array, RelPtr};

/// A C struct or union: field names and a parallel list of field encodings
#[derive(Clone, Copy)]
pub struct RecordMeta<'a> {
    header: MetaHeader<'a>,
}

record_view!(RecordMeta);

impl<'a> RecordMeta<'a> {
    /// Field names in declaration order
    pub fn field_names(&self) -> Array<'a, RelPtr<&'a str>> {
        Array::resolve(self.header.read_ptr(0), self.header.file())
    }

    /// Number of fields
    pub fn field_count(&self) -> usize {
        self.field_names().len()
    }

    /// Field encodings in declaration order
    pub fn field_encodings(&self) -> EncodingList<'a> {
        encoding_list(self.header, 4)
    }

    /// `(name, encoding)` pairs in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, TypeEncoding<'a>)> + 'a {
        let file = self.header.file();
        self.field_names()
            .iter()
            .map(move |name| name.value(file).unwrap_or(""))
            .zip(self.field_encodings().iter())
    }
}

/// A C function: return type followed by parameter encodings
#[derive(Clone, Copy)]
pub struct FunctionMeta<'a> {
    header: MetaHeader<'a>,
}

record_view!(FunctionMeta);

impl<'a> FunctionMeta<'a> {
    /// Function flags
    pub fn flags(&self) -> FunctionFlags {
        FunctionFlags::from_bits(self.header.flags())
    }

    /// Takes a variable argument list
    pub fn is_variadic(&self) -> bool {
        self.flags().variadic
    }

    /// Caller owns the returned object
    pub fn owns_returned_object(&self) -> bool {
        self.flags().owns_returned_object
    }

    /// Returned object is not managed by the runtime
    pub fn returns_unmanaged(&self) -> bool {
        self.flags().returns_unmanaged
    }

    /// Return type followed by the parameters
    pub fn encodings(&self) -> EncodingList<'a> {
        encoding_list(self.header, 0)
    }

    /// Return type encoding
    pub fn return_type(&self) -> Option<TypeEncoding<'a>> {
        self.encodings().first()
    }

    /// Parameter encodings
    pub fn parameters(&self) -> impl Iterator<Item = TypeEncoding<'a>> + 'a {
        self.encodings().iter().skip(1)
    }

    /// Number of declared parameters
    pub fn parameter_count(&self) -> usize {
        self.encodings().len().saturating_sub(1)
    }
}

/// A global variable or constant
#[derive(Clone, Copy)]
pub struct VarMeta<'a> {
    header: MetaHeader<'a>,
}

record_view!(VarMeta);

impl<'a> VarMeta<'a> {
    /// Type of the variable
    pub fn encoding(&self) -> Option<TypeEncoding<'a>> {
        self.header
            .read_ptr::<TypeEncoding<'a>>(0)
            .value(self.header.file())
    }
}

/// Script source inlined into the metadata
#[derive(Clone, Copy)]
pub struct JsCodeMeta<'a> {
    header: MetaHeader<'a>,
}

record_view!(JsCodeMeta);

impl<'a> JsCodeMeta<'a> {
    /// The source text
    pub fn js_code(&self) -> &'a str {
        self.header
            .read_ptr::<&'a str>(0)
            .value(self.header.file())
            .unwrap_or("")
    }
}

/// `i32`-counted encoding list behind the pointer at `tail_offset`; null
/// reads as empty.
pub(crate) fn encoding_list<'a>(header: MetaHeader<'a>, tail_offset: usize) -> EncodingList<'a> {
    let file = header.file();
    match header.read_ptr::<()>(tail_offset).address(file) {
        Some(pos) => EncodingList::with_i32_count(file, pos),
        None => EncodingList::empty(file),
    }
}

#[cfg(test)]
mod tests {
    use crate::encoding::EncodingKind;
    use crate::file::MetaFile;
    use crate::meta::FunctionFlags;
    use crate::version::SystemVersion;
    use crate::writer::{
        EncodingDef, FunctionDef, JsCodeDef, MetaDef, MetadataWriter, RecordDef, VarDef,
    };

    fn blob() -> Vec<u8> {
        let mut writer = MetadataWriter::new(4);
        writer.add_struct(
            RecordDef::new(MetaDef::new("CGPoint"))
                .field("x", EncodingDef::double())
                .field("y", EncodingDef::double()),
        );
        writer.add_function(
            FunctionDef::new(
                MetaDef::new("NSLog"),
                vec![EncodingDef::void(), EncodingDef::id()],
            )
            .flags(FunctionFlags {
                variadic: true,
                ..FunctionFlags::default()
            }),
        );
        writer.add_function(FunctionDef::new(MetaDef::new("abort"), vec![EncodingDef::void()]));
        writer.add_var(VarDef::new(MetaDef::new("NSNotFound"), EncodingDef::long()));
        writer.add_js_code(JsCodeDef::new(MetaDef::new("NSMakeRange"), "function NSMakeRange() {}"));
        writer.finish()
    }

    #[test]
    fn test_struct_fields() {
        let bytes = blob();
        let file = MetaFile::new(&bytes, SystemVersion::LATEST).unwrap();
        let point = file
            .global_table()
            .find_meta("CGPoint", false)
            .and_then(|e| e.as_record())
            .unwrap();
        assert_eq!(point.field_count(), 2);
        let fields: Vec<_> = point.fields().map(|(name, e)| (name, e.kind())).collect();
        assert_eq!(
            fields,
            [("x", Some(EncodingKind::Double)), ("y", Some(EncodingKind::Double))]
        );
    }

    #[test]
    fn test_function_signature_and_flags() {
        let bytes = blob();
        let file = MetaFile::new(&bytes, SystemVersion::LATEST).unwrap();
        let table = file.global_table();

        let log = table.find_meta("NSLog", false).and_then(|e| e.as_function()).unwrap();
        assert!(log.is_variadic());
        assert!(!log.owns_returned_object());
        assert_eq!(log.return_type().and_then(|e| e.kind()), Some(EncodingKind::Void));
        assert_eq!(log.parameter_count(), 1);
        assert_eq!(
            log.parameters().map(|e| e.kind()).collect::<Vec<_>>(),
            [Some(EncodingKind::Id)]
        );

        let abort = table.find_meta("abort", false).and_then(|e| e.as_function()).unwrap();
        assert!(!abort.is_variadic());
        assert_eq!(abort.parameter_count(), 0);
    }

    #[test]
    fn test_var_and_js_code() {
        let bytes = blob();
        let file = MetaFile::new(&bytes, SystemVersion::LATEST).unwrap();
        let table = file.global_table();

        let var = table.find_meta("NSNotFound", false).and_then(|e| e.as_var()).unwrap();
        assert_eq!(var.encoding().and_then(|e| e.kind()), Some(EncodingKind::Long));

        let code = table.find_meta("NSMakeRange", false).and_then(|e| e.as_js_code()).unwrap();
        assert_eq!(code.js_code(), "function NSMakeRange() {}");
    }
}
