use std::path::Path;

use anyhow::{bail, Result};

use dtswatch::config::load_or_default;
use dtswatch::fs::LocalFs;

pub fn cmd_parse(base: &Path, json: bool) -> Result<()> {
    let config = load_or_default(base);
    let root = config.declaration_root(base);
    let report = dtswatch::parse_directory(&root, &LocalFs::new())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.tree)?);
    } else {
        println!("Declaration root: {}", root.display());
        for module in &report.tree {
            println!("\n{} ({})", module.module_name, module.relative_path);
            for function in &module.functions {
                println!("  {function}");
            }
        }
        let functions: usize = report.tree.modules().iter().map(|m| m.functions.len()).sum();
        println!("\n✓ {} modules, {} functions", report.tree.len(), functions);
    }

    for failure in &report.failures {
        eprintln!("✗ {failure}");
    }
    if !report.is_clean() {
        bail!("{} file(s) failed to parse", report.failures.len());
    }
    Ok(())
}
