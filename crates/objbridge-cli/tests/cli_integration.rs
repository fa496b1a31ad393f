//! Integration tests for the metadump commands.
//!
//! Each test writes a small blob with the metadata writer, runs a command
//! against it and inspects the uncolored report.

use objbridge_cli::commands::{find, hierarchy, info, list, members, modules};
use objbridge_cli::output::StyledOutput;
use objbridge_meta::writer::{
    ClassDef, EncodingDef, FunctionDef, LibraryDef, MetaDef, MetadataWriter, MethodDef, ModuleDef,
    PropertyDef, RecordDef,
};
use objbridge_meta::{MetaFile, SystemVersion};
use termcolor::Buffer;

fn fixture() -> Vec<u8> {
    let mut writer = MetadataWriter::new(5);
    let uikit = writer.add_module(
        ModuleDef::new("UIKit")
            .framework(true)
            .system(true)
            .library(LibraryDef::new("UIKit").framework(true)),
    );
    let meta = |name: &str| MetaDef::new(name).module(uikit);

    writer.add_interface(ClassDef::new(meta("NSObject")).protocol("NSObjectProtocol"));
    writer.add_protocol(ClassDef::new(meta("NSObjectProtocol")).instance_method(
        MethodDef::new("isEqual", "isEqual:", vec![EncodingDef::bool(), EncodingDef::id()]),
    ));
    writer.add_interface(ClassDef::new(meta("UIResponder")).base("NSObject"));
    writer.add_interface(
        ClassDef::new(meta("UIView").introduced(14, 0))
            .base("UIResponder")
            .instance_method(
                MethodDef::new(
                    "initWithFrame",
                    "initWithFrame:",
                    vec![EncodingDef::instance_type(), EncodingDef::Struct("CGRect".into())],
                )
                .initializer()
                .constructor_tokens("frame"),
            )
            .static_method(MethodDef::new("layerClass", "layerClass", vec![EncodingDef::id()]))
            .instance_property(
                PropertyDef::new("hidden")
                    .getter(MethodDef::new("isHidden", "isHidden", vec![EncodingDef::bool()]))
                    .setter(MethodDef::new(
                        "setHidden",
                        "setHidden:",
                        vec![EncodingDef::void(), EncodingDef::bool()],
                    )),
            ),
    );
    writer.add_struct(
        RecordDef::new(meta("CGPoint"))
            .field("x", EncodingDef::double())
            .field("y", EncodingDef::double()),
    );
    writer.add_function(
        FunctionDef::new(
            meta("UIGraphicsBeginImageContext").introduced(8, 0),
            vec![EncodingDef::void(), EncodingDef::Struct("CGSize".into())],
        ),
    );
    writer.finish()
}

fn open(blob: &[u8], major: u8) -> MetaFile<'_> {
    MetaFile::new(blob, SystemVersion::new(major, 0)).unwrap()
}

fn output() -> StyledOutput<Buffer> {
    StyledOutput::new(Buffer::no_color())
}

fn text(out: StyledOutput<Buffer>) -> String {
    String::from_utf8(out.into_inner().into_inner()).unwrap()
}

fn field(label: &str, value: &str) -> String {
    format!("  {:<16}{}\n", format!("{}:", label), value)
}

#[test]
fn test_info_counts_kinds() {
    let blob = fixture();
    let mut out = output();
    info::execute(open(&blob, 13), &mut out).unwrap();
    let report = text(out);

    assert!(report.contains(&field("Buckets", "5")));
    assert!(report.contains(&field("Modules", "1")));
    assert!(report.contains(&field("Entities", "6 (5 available)")));
    assert!(report.contains(&field("interface", "3 (2 available)")));
    assert!(report.contains(&field("protocol", "1 (1 available)")));
    assert!(report.contains(&field("function", "1 (1 available)")));
    assert!(!report.contains("union:"));
}

#[test]
fn test_find_struct_lists_fields() {
    let blob = fixture();
    let mut out = output();
    find::execute(open(&blob, 15), "CGPoint", false, &mut out).unwrap();
    let report = text(out);

    assert!(report.starts_with("struct CGPoint\n"));
    assert!(report.contains(&field("Module", "UIKit")));
    assert!(report.contains(&field("Fields", "2")));
    assert!(report.contains("    x: double"));
    assert!(report.contains("    y: double"));
}

#[test]
fn test_find_respects_availability() {
    let blob = fixture();
    let mut out = output();
    let err = find::execute(open(&blob, 13), "UIView", false, &mut out).unwrap_err();
    assert!(err.to_string().contains("not available on 13.0 (since 14.0)"));

    let mut out = output();
    find::execute(open(&blob, 13), "UIView", true, &mut out).unwrap();
    let report = text(out);
    assert!(report.contains(&field("Available", "no")));
    assert!(report.contains(&field("Introduced", "14.0")));
    assert!(report.contains(&field("Base", "UIResponder")));
    assert!(report.contains(&field("Initializers", "1")));

    let err = find::execute(open(&blob, 13), "NSNothing", true, &mut output()).unwrap_err();
    assert_eq!(err.to_string(), "No entity named 'NSNothing'");
}

#[test]
fn test_list_filters_kind_and_availability() {
    let blob = fixture();
    let file = open(&blob, 13);

    assert_eq!(list::execute(file, None, false, &mut output()).unwrap(), 5);
    assert_eq!(list::execute(file, None, true, &mut output()).unwrap(), 6);

    let mut out = output();
    let count = list::execute(file, Some(list::KindFilter::Interface), true, &mut out).unwrap();
    assert_eq!(count, 3);
    let report = text(out);
    let names: Vec<&str> = report.lines().map(|l| l.split_whitespace().nth(1).unwrap()).collect();
    assert_eq!(names, ["NSObject", "UIResponder", "UIView"]);
    assert!(report.contains("UIView (since 14.0) unavailable"));
}

#[test]
fn test_members_of_interface() {
    let blob = fixture();
    let mut out = output();
    let listed = members::execute(open(&blob, 15), "UIView", None, false, &mut out).unwrap();
    assert_eq!(listed, 3);
    let report = text(out);

    assert!(report.contains("Instance methods\n  -initWithFrame: (instancetype, struct CGRect) [as initWithFrame, init, tokens frame]"));
    assert!(report.contains("Static methods\n  +layerClass (id)"));
    assert!(report.contains("Instance properties\n  hidden {isHidden, setHidden:}"));

    let mut out = output();
    let listed = members::execute(
        open(&blob, 15),
        "UIView",
        Some(members::MemberFilter::StaticMethod),
        false,
        &mut out,
    )
    .unwrap();
    assert_eq!(listed, 1);
}

#[test]
fn test_members_fall_back_to_base_and_protocols() {
    let blob = fixture();
    let mut out = output();
    members::execute(open(&blob, 13), "UIView", None, false, &mut out).unwrap();
    assert!(text(out).starts_with("UIView is not available on 13.0, showing UIResponder\n"));

    let mut out = output();
    let listed = members::execute(open(&blob, 13), "NSObjectProtocol", None, false, &mut out).unwrap();
    assert_eq!(listed, 1);
    assert!(text(out).contains("-isEqual: (bool, id) [as isEqual]"));

    assert!(members::execute(open(&blob, 13), "CGPoint", None, false, &mut output()).is_err());
}

#[test]
fn test_hierarchy_chain() {
    let blob = fixture();
    let mut out = output();
    let chain = hierarchy::execute(open(&blob, 15), "UIView", &mut out).unwrap();
    assert_eq!(chain, ["UIView", "UIResponder", "NSObject"]);
    assert_eq!(text(out), "UIView\n  UIResponder\n    NSObject <NSObjectProtocol>\n");
}

#[test]
fn test_modules_report() {
    let blob = fixture();
    let mut out = output();
    modules::execute(open(&blob, 15), &mut out).unwrap();
    assert_eq!(text(out), "UIKit [framework, system]\n  links UIKit (framework)\n");
}
