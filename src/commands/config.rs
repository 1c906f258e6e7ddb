use std::io;
use std::path::Path;

use anyhow::Result;

use dtswatch::config::{load_with_warnings, Config, CONFIG_FILE_NAME};
use dtswatch::DtsError;

pub fn cmd_config(base: &Path, json: bool) -> Result<()> {
    let path = base.join(CONFIG_FILE_NAME);
    let (config, warnings, found) = match load_with_warnings(&path) {
        Ok((config, warnings)) => (config, warnings, true),
        Err(DtsError::ReadFailed { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            (Config::default(), Vec::new(), false)
        }
        Err(err) => return Err(err.into()),
    };

    if !json {
        if found {
            println!("# {}", path.display());
        } else {
            println!("# {} not found; defaults", path.display());
        }
    }
    println!("{}", config.to_json());

    for warning in &warnings {
        eprintln!("warning: {warning}");
    }
    Ok(())
}
