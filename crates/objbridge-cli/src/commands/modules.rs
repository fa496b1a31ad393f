//! `metadump modules`: the Module Table with linked libraries.

use crate::output::StyledOutput;
use objbridge_meta::MetaFile;
use termcolor::WriteColor;

pub fn execute<W: WriteColor>(file: MetaFile<'_>, out: &mut StyledOutput<W>) -> anyhow::Result<()> {
    for module in file.modules() {
        out.name(module.name());
        let mut flags = Vec::new();
        if module.is_framework() {
            flags.push("framework");
        }
        if module.is_system() {
            flags.push("system");
        }
        if !flags.is_empty() {
            out.tag(&format!(" [{}]", flags.join(", ")));
        }
        out.newline();

        for library in module.libraries().iter().filter_map(|l| l.value(file)) {
            out.plain("  links ");
            out.plain(library.name());
            if library.is_framework() {
                out.dim(" (framework)");
            }
            out.newline();
        }
    }
    out.flush();
    Ok(())
}
