use super::{json_pretty, EXIT_CHANGED, EXIT_SUCCESS};
use console::Style;
use pyrite_schema::PyProject;
use similar::{ChangeTag, TextDiff};
use std::path::Path;

pub fn run(file: &Path, diff: bool, check: bool, json: bool) -> Result<u8, String> {
    let outcome = PyProject::reformat(file).map_err(|e| format!("config error: {e}"))?;

    if diff && outcome.changed {
        print_diff(&outcome.original, &outcome.reformatted);
    }

    if outcome.changed && !check {
        std::fs::write(file, &outcome.reformatted)
            .map_err(|e| format!("failed to write '{}': {e}", file.display()))?;
    }

    if json {
        let report = serde_json::json!({
            "file": file.display().to_string(),
            "changed": outcome.changed,
            "written": outcome.changed && !check,
        });
        println!("{}", json_pretty(&report)?);
    } else if outcome.changed {
        let verb = if check { "would reformat" } else { "reformatted" };
        println!("{verb} {}", file.display());
    } else {
        println!("{} is already formatted", file.display());
    }

    if outcome.changed {
        Ok(EXIT_CHANGED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

fn print_diff(original: &str, reformatted: &str) {
    let text_diff = TextDiff::from_lines(original, reformatted);
    for change in text_diff.iter_all_changes() {
        let (sign, style) = match change.tag() {
            ChangeTag::Delete => ("-", Style::new().red()),
            ChangeTag::Insert => ("+", Style::new().green()),
            ChangeTag::Equal => (" ", Style::new().dim()),
        };
        print!("{}{}", style.apply_to(sign), style.apply_to(change.value()));
        if change.missing_newline() {
            println!();
        }
    }
}
