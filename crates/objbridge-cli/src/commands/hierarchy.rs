//! `metadump hierarchy <interface>`: the base class chain.

use crate::output::StyledOutput;
use anyhow::anyhow;
use objbridge_meta::{InterfaceMeta, MetaFile, MetaRecord};
use termcolor::WriteColor;

/// Print the chain from `name` up to its root; returns the names in order.
pub fn execute<'a, W: WriteColor>(
    file: MetaFile<'a>,
    name: &str,
    out: &mut StyledOutput<W>,
) -> anyhow::Result<Vec<&'a str>> {
    let interface = file
        .global_table()
        .find_interface_meta(name)
        .ok_or_else(|| anyhow!("No interface named '{}'", name))?;

    let chain: Vec<InterfaceMeta<'a>> = std::iter::once(interface)
        .chain(interface.ancestors())
        .collect();
    for (depth, class) in chain.iter().enumerate() {
        out.plain(&"  ".repeat(depth));
        out.name(class.js_name());
        let protocols: Vec<&str> = class
            .protocol_names()
            .iter()
            .filter_map(|p| p.value(file))
            .collect();
        if !protocols.is_empty() {
            out.dim(&format!(" <{}>", protocols.join(", ")));
        }
        out.newline();
    }
    if let Some(missing) = chain
        .last()
        .filter(|root| root.base_meta().is_none())
        .and_then(|root| root.base_name())
    {
        out.warning(&format!("base {} is not in the metadata", missing));
        out.newline();
    }
    out.flush();
    Ok(chain.iter().map(|c| c.js_name()).collect())
}
