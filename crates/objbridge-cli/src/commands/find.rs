//! `metadump find <name>`: describe one top-level entity.

use super::{since_suffix, version_label};
use crate::output::StyledOutput;
use anyhow::bail;
use objbridge_meta::{BaseClassMeta, Entity, MetaFile, MetaRecord};
use termcolor::WriteColor;

pub fn execute<W: WriteColor>(
    file: MetaFile<'_>,
    name: &str,
    include_unavailable: bool,
    out: &mut StyledOutput<W>,
) -> anyhow::Result<()> {
    let table = file.global_table();
    let Some(entity) = table.find_meta(name, !include_unavailable) else {
        if let Some(hidden) = table.find_meta(name, false) {
            bail!(
                "'{}' is a {} not available on {}{} (use --all)",
                name,
                hidden.kind(),
                file.system_version(),
                since_suffix(hidden.header().introduced_in())
            );
        }
        bail!("No entity named '{}'", name);
    };
    describe(entity, out);
    out.flush();
    Ok(())
}

/// Header fields plus the kind-specific details of `entity`.
pub fn describe<W: WriteColor>(entity: Entity<'_>, out: &mut StyledOutput<W>) {
    let header = entity.header();
    out.tag(entity.kind().name());
    out.plain(" ");
    out.name(entity.js_name());
    out.newline();

    if header.has_dual_name() {
        out.field("Native name", entity.name());
    }
    out.field(
        "Introduced",
        &version_label(header.introduced_in()).unwrap_or_else(|| "-".to_string()),
    );
    out.field("Available", if entity.is_available() { "yes" } else { "no" });
    if let Some(module) = header.module() {
        out.field("Module", module.name());
    }

    match entity {
        Entity::Struct(record) | Entity::Union(record) => {
            out.field("Fields", &record.field_count().to_string());
            for (name, encoding) in record.fields() {
                out.plain("    ");
                out.name(name);
                out.plain(": ");
                out.dim(&encoding.to_string());
                out.newline();
            }
        }
        Entity::Function(function) => {
            let returns = function
                .return_type()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "void".to_string());
            let params: Vec<String> = function.parameters().map(|e| e.to_string()).collect();
            out.field("Returns", &returns);
            out.field("Parameters", &format!("({})", params.join(", ")));
            let flags = function.flags();
            let mut notes = Vec::new();
            if flags.variadic {
                notes.push("variadic");
            }
            if flags.owns_returned_object {
                notes.push("owns-returned");
            }
            if flags.returns_unmanaged {
                notes.push("unmanaged");
            }
            if !notes.is_empty() {
                out.field("Flags", &notes.join(", "));
            }
        }
        Entity::Var(var) => {
            let ty = var.encoding().map(|e| e.to_string()).unwrap_or_default();
            out.field("Type", &ty);
        }
        Entity::JsCode(code) => {
            out.field("Code", code.js_code());
        }
        Entity::Interface(interface) => {
            out.field("Base", interface.base_name().unwrap_or("-"));
            describe_members(*interface, out);
        }
        Entity::Protocol(protocol) => {
            describe_members(*protocol, out);
        }
    }
}

fn describe_members<W: WriteColor>(class: BaseClassMeta<'_>, out: &mut StyledOutput<W>) {
    let file = class.header().file();
    let protocols: Vec<&str> = class
        .protocol_names()
        .iter()
        .filter_map(|p| p.value(file))
        .collect();
    if !protocols.is_empty() {
        out.field("Protocols", &protocols.join(", "));
    }
    out.field("Instance methods", &class.instance_methods().len().to_string());
    out.field("Static methods", &class.static_methods().len().to_string());
    out.field(
        "Properties",
        &format!(
            "{} instance, {} static",
            class.instance_properties_array().len(),
            class.static_properties_array().len()
        ),
    );
    let initializers = class.declared_initializers().count();
    if initializers > 0 {
        out.field("Initializers", &initializers.to_string());
    }
}
