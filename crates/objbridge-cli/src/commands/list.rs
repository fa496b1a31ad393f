//! `metadump list [--kind K]`: every entity, sorted by name.

use super::since_suffix;
use crate::output::StyledOutput;
use objbridge_meta::{MetaFile, MetaKind};
use termcolor::WriteColor;

/// Entity kind accepted by `--kind`
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    Struct,
    Union,
    Function,
    Jscode,
    Var,
    Interface,
    Protocol,
}

impl From<KindFilter> for MetaKind {
    fn from(filter: KindFilter) -> Self {
        match filter {
            KindFilter::Struct => MetaKind::Struct,
            KindFilter::Union => MetaKind::Union,
            KindFilter::Function => MetaKind::Function,
            KindFilter::Jscode => MetaKind::JsCode,
            KindFilter::Var => MetaKind::Var,
            KindFilter::Interface => MetaKind::Interface,
            KindFilter::Protocol => MetaKind::Protocol,
        }
    }
}

/// Print the matching entities; returns how many were listed.
pub fn execute<W: WriteColor>(
    file: MetaFile<'_>,
    kind: Option<KindFilter>,
    include_unavailable: bool,
    out: &mut StyledOutput<W>,
) -> anyhow::Result<usize> {
    let kind = kind.map(MetaKind::from);
    let mut entities: Vec<_> = file
        .global_table()
        .iter()
        .filter(|e| kind.map_or(true, |k| e.kind() == k))
        .filter(|e| include_unavailable || e.is_available())
        .collect();
    entities.sort_by(|a, b| {
        a.js_name()
            .cmp(b.js_name())
            .then_with(|| a.kind().to_u8().cmp(&b.kind().to_u8()))
    });

    for entity in &entities {
        out.tag(&format!("{:<10}", entity.kind().name()));
        out.name(entity.js_name());
        out.dim(&since_suffix(entity.header().introduced_in()));
        if !entity.is_available() {
            out.warning(" unavailable");
        }
        out.newline();
    }
    out.flush();
    Ok(entities.len())
}
