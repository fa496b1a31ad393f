//! `metadump members <class> [--kind K]`: the member tables of an interface
//! or protocol.

use super::since_suffix;
use crate::output::StyledOutput;
use anyhow::anyhow;
use objbridge_meta::{
    BaseClassMeta, MemberKind, MetaFile, MetaRecord, MethodMeta, PropertyMeta,
};
use termcolor::WriteColor;

/// Member table accepted by `--kind`
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberFilter {
    InstanceMethod,
    StaticMethod,
    InstanceProperty,
    StaticProperty,
}

impl From<MemberFilter> for MemberKind {
    fn from(filter: MemberFilter) -> Self {
        match filter {
            MemberFilter::InstanceMethod => MemberKind::InstanceMethod,
            MemberFilter::StaticMethod => MemberKind::StaticMethod,
            MemberFilter::InstanceProperty => MemberKind::InstanceProperty,
            MemberFilter::StaticProperty => MemberKind::StaticProperty,
        }
    }
}

const ALL_KINDS: [MemberKind; 4] = [
    MemberKind::InstanceMethod,
    MemberKind::StaticMethod,
    MemberKind::InstanceProperty,
    MemberKind::StaticProperty,
];

/// Print the members; returns how many were listed.
pub fn execute<W: WriteColor>(
    file: MetaFile<'_>,
    class: &str,
    kind: Option<MemberFilter>,
    include_unavailable: bool,
    out: &mut StyledOutput<W>,
) -> anyhow::Result<usize> {
    let table = file.global_table();
    let meta: BaseClassMeta<'_> = match table.find_interface_meta(class) {
        Some(interface) => {
            if interface.js_name() != class {
                out.warning(&format!(
                    "{} is not available on {}, showing {}",
                    class,
                    file.system_version(),
                    interface.js_name()
                ));
                out.newline();
            }
            *interface
        }
        None => *table
            .find_protocol(class)
            .ok_or_else(|| anyhow!("No interface or protocol named '{}'", class))?,
    };

    let kinds = match kind {
        Some(filter) => vec![MemberKind::from(filter)],
        None => ALL_KINDS.to_vec(),
    };
    let mut listed = 0;
    for kind in kinds {
        listed += match kind {
            MemberKind::InstanceMethod => {
                print_methods(meta.instance_methods().iter(), kind, include_unavailable, file, out)
            }
            MemberKind::StaticMethod => {
                print_methods(meta.static_methods().iter(), kind, include_unavailable, file, out)
            }
            MemberKind::InstanceProperty => print_properties(
                meta.instance_properties_array().iter(),
                kind,
                include_unavailable,
                file,
                out,
            ),
            MemberKind::StaticProperty => print_properties(
                meta.static_properties_array().iter(),
                kind,
                include_unavailable,
                file,
                out,
            ),
        };
    }
    out.flush();
    Ok(listed)
}

fn section_title(kind: MemberKind) -> &'static str {
    match kind {
        MemberKind::InstanceMethod => "Instance methods",
        MemberKind::StaticMethod => "Static methods",
        MemberKind::InstanceProperty => "Instance properties",
        MemberKind::StaticProperty => "Static properties",
    }
}

fn print_methods<'a, W: WriteColor>(
    methods: impl Iterator<Item = objbridge_meta::RelPtr<MethodMeta<'a>>>,
    kind: MemberKind,
    include_unavailable: bool,
    file: MetaFile<'a>,
    out: &mut StyledOutput<W>,
) -> usize {
    let methods: Vec<_> = methods
        .filter_map(|p| p.value(file))
        .filter(|m| include_unavailable || m.is_available())
        .collect();
    if methods.is_empty() {
        return 0;
    }
    out.heading(section_title(kind));
    let sigil = if kind.is_static() { "+" } else { "-" };
    for method in &methods {
        out.plain(&format!("  {}", sigil));
        out.name(method.selector());
        out.plain(" ");
        out.dim(&method.encodings().to_string());
        let mut notes = Vec::new();
        if method.js_name() != method.selector() {
            notes.push(format!("as {}", method.js_name()));
        }
        if method.is_initializer() {
            notes.push("init".to_string());
        }
        if method.is_optional() {
            notes.push("optional".to_string());
        }
        if method.is_variadic() {
            notes.push("variadic".to_string());
        }
        if let Some(tokens) = method.constructor_tokens() {
            notes.push(format!("tokens {}", tokens));
        }
        if !notes.is_empty() {
            out.tag(&format!(" [{}]", notes.join(", ")));
        }
        out.dim(&since_suffix(method.introduced_in()));
        out.newline();
    }
    methods.len()
}

fn print_properties<'a, W: WriteColor>(
    properties: impl Iterator<Item = objbridge_meta::RelPtr<PropertyMeta<'a>>>,
    kind: MemberKind,
    include_unavailable: bool,
    file: MetaFile<'a>,
    out: &mut StyledOutput<W>,
) -> usize {
    let properties: Vec<_> = properties
        .filter_map(|p| p.value(file))
        .filter(|p| include_unavailable || p.is_available())
        .collect();
    if properties.is_empty() {
        return 0;
    }
    out.heading(section_title(kind));
    for property in &properties {
        out.plain("  ");
        out.name(property.js_name());
        let accessors: Vec<&str> = property
            .getter()
            .into_iter()
            .chain(property.setter())
            .map(|m| m.selector())
            .collect();
        out.dim(&format!(" {{{}}}", accessors.join(", ")));
        if property.is_optional() {
            out.tag(" [optional]");
        }
        out.dim(&since_suffix(property.introduced_in()));
        out.newline();
    }
    properties.len()
}
