pub mod check;
pub mod completions;
pub mod info;
pub mod man_pages;
pub mod reformat;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
/// `reformat` signals "the file changed (or would change)" with this code.
pub const EXIT_CHANGED: u8 = 4;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}
