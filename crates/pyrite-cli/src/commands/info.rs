use super::{json_pretty, EXIT_SUCCESS};
use pyrite_schema::{ParseOptions, PyProject};
use std::path::Path;

pub fn run(field: &str, file: &Path, resolve: bool) -> Result<u8, String> {
    let mut doc = PyProject::load(file, &ParseOptions::default())
        .map_err(|e| format!("config error: {e}"))?;
    if resolve {
        doc.resolve_files().map_err(|e| format!("config error: {e}"))?;
    }
    let value = doc
        .lookup(field)
        .map_err(|e| format!("config error: {e}"))?;
    println!("{}", json_pretty(&value)?);
    Ok(EXIT_SUCCESS)
}
