//! Deterministic TOML encoder.
//!
//! The `toml` crate decodes documents; output goes through this encoder
//! instead so the on-disk form is stable under reformatting: keys in
//! insertion order, tables depth-first with blank lines between blocks,
//! arrays of tables as `[[path]]` blocks, inline arrays with a trailing
//! comma that wrap one-per-line past a width budget.

#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Maximum single-line width for an inline array, including the key.
    pub array_width: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { array_width: 100 }
    }
}

/// Encode a whole document.
pub fn encode_document(table: &toml::Table, opts: &EncodeOptions) -> String {
    let mut blocks = Vec::new();
    collect_blocks(&mut blocks, None, table, opts);
    let mut out = blocks.join("\n");
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Emit one table as a sequence of blocks: direct pairs first, then arrays
/// of tables, then sub-tables depth-first. The `[header]` line is skipped
/// for tables that exist only to hold sub-tables.
fn collect_blocks(
    blocks: &mut Vec<String>,
    header: Option<&str>,
    table: &toml::Table,
    opts: &EncodeOptions,
) {
    let mut pairs = String::new();
    let mut array_tables: Vec<(String, &[toml::Value])> = Vec::new();
    let mut sub_tables: Vec<(String, &toml::Table)> = Vec::new();

    for (key, value) in table {
        let encoded_key = encode_key(key);
        let full_path = match header {
            Some(prefix) => format!("{prefix}.{encoded_key}"),
            None => encoded_key.clone(),
        };
        match value {
            toml::Value::Table(sub) => sub_tables.push((full_path, sub)),
            toml::Value::Array(items)
                if !items.is_empty() && items.iter().all(toml::Value::is_table) =>
            {
                array_tables.push((full_path, items));
            }
            other => {
                pairs.push_str(&encode_pair(&encoded_key, other, opts));
                pairs.push('\n');
            }
        }
    }

    let is_leaf = array_tables.is_empty() && sub_tables.is_empty();
    if let Some(name) = header {
        if !pairs.is_empty() || is_leaf {
            blocks.push(format!("[{name}]\n{pairs}"));
        }
    } else if !pairs.is_empty() {
        blocks.push(pairs);
    }

    for (name, items) in array_tables {
        for item in items {
            let element = match item {
                toml::Value::Table(element) => element,
                _ => unreachable!("filtered to all-table arrays"),
            };
            collect_array_element(blocks, &name, element, opts);
        }
    }

    for (name, sub) in sub_tables {
        collect_blocks(blocks, Some(&name), sub, opts);
    }
}

/// One `[[name]]` element. Nested sub-tables of the element are emitted as
/// dotted blocks after it.
fn collect_array_element(
    blocks: &mut Vec<String>,
    name: &str,
    element: &toml::Table,
    opts: &EncodeOptions,
) {
    let mut pairs = String::new();
    let mut nested: Vec<(String, &toml::Table)> = Vec::new();
    for (key, value) in element {
        let encoded_key = encode_key(key);
        match value {
            toml::Value::Table(sub) => nested.push((format!("{name}.{encoded_key}"), sub)),
            other => {
                pairs.push_str(&encode_pair(&encoded_key, other, opts));
                pairs.push('\n');
            }
        }
    }
    blocks.push(format!("[[{name}]]\n{pairs}"));
    for (sub_name, sub) in nested {
        collect_blocks(blocks, Some(&sub_name), sub, opts);
    }
}

fn encode_pair(key: &str, value: &toml::Value, opts: &EncodeOptions) -> String {
    if let toml::Value::Array(items) = value {
        let single = encode_array_single_line(items);
        let line = format!("{key} = {single}");
        if items.is_empty() || line.len() <= opts.array_width {
            return line;
        }
        let mut out = format!("{key} = [\n");
        for item in items {
            out.push_str("    ");
            out.push_str(&encode_value(item));
            out.push_str(",\n");
        }
        out.push(']');
        return out;
    }
    format!("{key} = {}", encode_value(value))
}

fn encode_array_single_line(items: &[toml::Value]) -> String {
    if items.is_empty() {
        return "[]".to_owned();
    }
    let mut out = String::from("[");
    for item in items {
        out.push(' ');
        out.push_str(&encode_value(item));
        out.push(',');
    }
    out.push(']');
    out
}

fn encode_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => encode_str(s),
        toml::Value::Integer(n) => n.to_string(),
        toml::Value::Float(f) => encode_float(*f),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(items) => encode_array_single_line(items),
        toml::Value::Table(table) => encode_inline_table(table),
    }
}

fn encode_inline_table(table: &toml::Table) -> String {
    let pairs: Vec<String> = table
        .iter()
        .map(|(key, value)| format!("{} = {}", encode_key(key), encode_value(value)))
        .collect();
    if pairs.is_empty() {
        "{}".to_owned()
    } else {
        format!("{{ {} }}", pairs.join(", "))
    }
}

fn encode_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_owned()
    } else if f.is_infinite() {
        if f > 0.0 { "inf".to_owned() } else { "-inf".to_owned() }
    } else if f == f.trunc() && f.abs() < 1e15 {
        // A bare integral float must keep a fractional part to stay a float.
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

fn is_bare_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn encode_key(key: &str) -> String {
    if is_bare_key(key) {
        key.to_owned()
    } else {
        escape_double_quoted(key)
    }
}

/// Double quotes by default; a literal single-quoted string when the value
/// contains a double quote but nothing that would need escaping inside
/// single quotes.
fn encode_str(s: &str) -> String {
    let needs_escapes = s.contains('\'')
        || s.contains('\\')
        || s.chars().any(|c| c.is_control());
    if s.contains('"') && !needs_escapes {
        format!("'{s}'")
    } else {
        escape_double_quoted(s)
    }
}

fn escape_double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(text: &str) -> String {
        let table: toml::Table = text.parse().unwrap();
        encode_document(&table, &EncodeOptions::default())
    }

    #[test]
    fn emits_tables_in_order_with_blank_lines() {
        let out = encode(
            r#"
[build-system]
requires = ["whey"]
build-backend = "whey"

[project]
name = "demo"
version = "1.0"
"#,
        );
        assert_eq!(
            out,
            "[build-system]\n\
             requires = [ \"whey\",]\n\
             build-backend = \"whey\"\n\
             \n\
             [project]\n\
             name = \"demo\"\n\
             version = \"1.0\"\n"
        );
    }

    #[test]
    fn array_of_tables_uses_double_bracket_blocks() {
        let out = encode(
            r#"
[project]
name = "demo"
authors = [{name = "A", email = "a@example.com"}, {name = "B"}]
"#,
        );
        assert_eq!(
            out,
            "[project]\n\
             name = \"demo\"\n\
             \n\
             [[project.authors]]\n\
             name = \"A\"\n\
             email = \"a@example.com\"\n\
             \n\
             [[project.authors]]\n\
             name = \"B\"\n"
        );
    }

    #[test]
    fn header_is_skipped_for_tables_holding_only_sub_tables() {
        let out = encode(
            r#"
[tool.mypy]
strict = true
"#,
        );
        assert_eq!(out, "[tool.mypy]\nstrict = true\n");
    }

    #[test]
    fn short_arrays_stay_inline_with_trailing_comma() {
        let out = encode("keywords = [\"a\", \"b\"]");
        assert_eq!(out, "keywords = [ \"a\", \"b\",]\n");
        assert_eq!(encode("keywords = []"), "keywords = []\n");
    }

    #[test]
    fn long_arrays_wrap_one_element_per_line() {
        let table: toml::Table =
            r#"classifiers = ["Programming Language :: Python :: 3.10", "Programming Language :: Python :: 3.11"]"#
                .parse()
                .unwrap();
        let out = encode_document(&table, &EncodeOptions { array_width: 40 });
        assert_eq!(
            out,
            "classifiers = [\n\
             \x20   \"Programming Language :: Python :: 3.10\",\n\
             \x20   \"Programming Language :: Python :: 3.11\",\n\
             ]\n"
        );
    }

    #[test]
    fn string_quoting_prefers_double_with_single_quote_fallback() {
        assert_eq!(encode_str("plain"), "\"plain\"");
        assert_eq!(encode_str("has \"quotes\""), "'has \"quotes\"'");
        // Both quote kinds present forces escaped double quotes.
        assert_eq!(encode_str("'both' \"kinds\""), "\"'both' \\\"kinds\\\"\"");
        assert_eq!(encode_str("tab\there"), "\"tab\\there\"");
        assert_eq!(encode_str("line\nbreak"), "\"line\\nbreak\"");
        assert_eq!(encode_str("\u{1}"), "\"\\u0001\"");
    }

    #[test]
    fn keys_are_quoted_only_when_not_bare() {
        let out = encode(r#"
[project.urls]
Homepage = "https://example.com/"
"Source Code" = "https://example.com/src"
"#);
        assert_eq!(
            out,
            "[project.urls]\n\
             Homepage = \"https://example.com/\"\n\
             \"Source Code\" = \"https://example.com/src\"\n"
        );
    }

    #[test]
    fn output_reparses_to_the_same_table() {
        let source = r#"
[build-system]
requires = ["setuptools>=61"]

[project]
name = "demo"
keywords = ["k1", "k2"]
authors = [{name = "A"}]

[project.entry-points.pytest11]
demo = "demo.plugin:entry"

[tool.custom]
flag = true
count = 3
ratio = 1.0
"#;
        let table: toml::Table = source.parse().unwrap();
        let out = encode_document(&table, &EncodeOptions::default());
        let reparsed: toml::Table = out.parse().unwrap();
        assert_eq!(table, reparsed);
    }
}
