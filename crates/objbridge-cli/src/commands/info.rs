//! `metadump info`: table sizes and entity counts by kind.

use crate::output::StyledOutput;
use objbridge_meta::{MetaFile, MetaKind};
use termcolor::WriteColor;

const KINDS: [MetaKind; 7] = [
    MetaKind::Struct,
    MetaKind::Union,
    MetaKind::Function,
    MetaKind::JsCode,
    MetaKind::Var,
    MetaKind::Interface,
    MetaKind::Protocol,
];

pub fn execute<W: WriteColor>(file: MetaFile<'_>, out: &mut StyledOutput<W>) -> anyhow::Result<()> {
    let table = file.global_table();

    // index by kind tag, 1..=7
    let mut total = [0usize; 8];
    let mut available = [0usize; 8];
    for entity in table.iter() {
        let tag = entity.kind().to_u8() as usize;
        total[tag] += 1;
        if entity.is_available() {
            available[tag] += 1;
        }
    }

    out.heading("Metadata");
    out.field("Size", &format!("{} bytes", file.blob().len()));
    out.field("Heap base", &format!("{:#x}", file.heap_base()));
    out.field("System version", &file.system_version().to_string());
    out.field("Buckets", &table.bucket_count().to_string());
    out.field("Modules", &file.module_table().len().to_string());
    out.field(
        "Entities",
        &format!(
            "{} ({} available)",
            total.iter().sum::<usize>(),
            available.iter().sum::<usize>()
        ),
    );
    out.newline();

    out.heading("By kind");
    for kind in KINDS {
        let tag = kind.to_u8() as usize;
        if total[tag] == 0 {
            continue;
        }
        out.field(kind.name(), &format!("{} ({} available)", total[tag], available[tag]));
    }
    out.flush();
    Ok(())
}
