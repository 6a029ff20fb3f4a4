use super::{json_pretty, EXIT_SUCCESS};
use pyrite_schema::{ParseOptions, PyProject, BUILD_SYSTEM_SCHEMA, PROJECT_SCHEMA};
use std::path::Path;
use tracing::debug;

pub fn run(file: &Path, skip_readme: bool, json: bool) -> Result<u8, String> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| format!("failed to read '{}': {e}", file.display()))?;
    let raw: toml::Table = text
        .parse()
        .map_err(|e| format!("config error: TOML syntax error: {e}"))?;

    let opts = ParseOptions {
        set_defaults: true,
        check_readme: !skip_readme,
        ..ParseOptions::default()
    };
    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    let doc = PyProject::from_str(&text, dir, &opts).map_err(|e| format!("config error: {e}"))?;
    debug!(
        "parsed {}: build-system={}, project={}",
        file.display(),
        doc.build_system.is_some(),
        doc.project.is_some()
    );

    // The schema layer ignores keys it does not recognize; `check` is the
    // strict mode that rejects them, against the raw pre-parse tables.
    if let Some(toml::Value::Table(build_system)) = raw.get("build-system") {
        BUILD_SYSTEM_SCHEMA
            .check_unknown_keys(build_system, &[])
            .map_err(|e| format!("config error: {e}"))?;
    }
    if let Some(toml::Value::Table(project)) = raw.get("project") {
        PROJECT_SCHEMA
            .check_unknown_keys(project, &["dynamic"])
            .map_err(|e| format!("config error: {e}"))?;
    }

    if json {
        let report = serde_json::json!({
            "file": file.display().to_string(),
            "valid": true,
        });
        println!("{}", json_pretty(&report)?);
    } else {
        let ok = console::Style::new().green().apply_to("valid");
        println!("{}: {ok}", file.display());
    }
    Ok(EXIT_SUCCESS)
}
