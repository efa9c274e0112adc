// Line-range field surgery on raw YAML text.
//
// Mutates a single top-level field without reformatting unrelated lines.
// Only zero-indentation fields are addressable; nested edits go through the
// full re-serialization path instead. Every operation fails soft: when a
// field cannot be located the text comes back unchanged.

use serde_yaml::Value;

use super::fields;

/// Inclusive line range occupied by a top-level field, including nested
/// indented lines and blank lines owned by the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRange {
    pub start_line: usize,
    pub end_line: usize,
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_indented(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// A line opens a top-level field when it is non-blank, non-indented, not a
/// comment and contains a colon.
fn is_top_level_field(line: &str) -> bool {
    !is_blank(line) && !is_indented(line) && !is_comment(line) && line.contains(':')
}

/// Anchored match for `field:` at zero indentation. A field name appearing
/// only as a substring of another key never matches.
fn opens_field(line: &str, field: &str) -> bool {
    if is_indented(line) || is_comment(line) {
        return false;
    }
    match line.strip_prefix(field) {
        Some(rest) => rest.trim_start().starts_with(':'),
        None => false,
    }
}

/// Locates the line range a top-level field occupies.
///
/// Blank lines after the field body belong to it only when the next
/// non-blank line is indented; a blank line directly before another
/// top-level field is a separator and stays out of the range.
pub fn locate_field_range(lines: &[&str], field: &str) -> Option<FieldRange> {
    let start = lines.iter().position(|line| opens_field(line, field))?;
    let mut end = start;

    for i in start + 1..lines.len() {
        let line = lines[i];

        if is_top_level_field(line) {
            break;
        }

        if is_indented(line) && !is_blank(line) {
            end = i;
        } else if is_blank(line) {
            match lines[i + 1..].iter().find(|l| !is_blank(l)) {
                None => end = i,
                Some(next) if is_indented(next) => end = i,
                Some(next) if next.contains(':') => break,
                Some(_) => end = i,
            }
        } else {
            // Non-indented, non-blank line that is not a field.
            break;
        }
    }

    Some(FieldRange {
        start_line: start,
        end_line: end,
    })
}

/// Deletes a top-level field's range and renormalizes blank-line separators.
/// Returns the text unchanged when the field is not present.
pub fn remove_field(text: &str, field: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let range = match locate_field_range(&lines, field) {
        Some(range) => range,
        None => {
            tracing::debug!(field, "remove_field: field not found, leaving text unchanged");
            return text.to_string();
        }
    };

    let mut remaining: Vec<String> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if i < range.start_line || i > range.end_line {
            remaining.push((*line).to_string());
        }
    }

    let normalized = normalize_blank_lines(&remaining);
    join_lines(&normalized)
}

/// Inserts a field at its Field Order Table position, or appends it at end
/// of file for unknown keys.
pub fn insert_field(text: &str, field: &str, value: &Value) -> String {
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    let rendered = format_field_as_yaml(field, value);

    match fields::field_position(field) {
        None => append_field_at_end(&mut lines, &rendered),
        Some(position) => insert_field_in_order(&mut lines, &rendered, position),
    }

    join_lines(&lines)
}

fn append_field_at_end(lines: &mut Vec<String>, rendered: &[String]) {
    if let Some(last) = lines.last() {
        if !is_blank(last) {
            lines.push(String::new());
        }
    }
    lines.extend(rendered.iter().cloned());
    lines.push(String::new());
}

fn insert_field_in_order(lines: &mut Vec<String>, rendered: &[String], position: usize) {
    // The insertion point sits after the last preceding ordered field that is
    // actually present in the text.
    let mut insert_at = 0;
    for preceding in &fields::FIELD_ORDER[..position] {
        let found = lines.iter().position(|line| opens_field(line, preceding));
        if let Some(idx) = found {
            insert_at = end_of_field(lines, idx);
        }
    }

    if insert_at > 0 && !is_blank(&lines[insert_at - 1]) {
        lines.insert(insert_at, String::new());
        insert_at += 1;
    }

    for (offset, line) in rendered.iter().enumerate() {
        lines.insert(insert_at + offset, line.clone());
    }
    lines.insert(insert_at + rendered.len(), String::new());
}

/// Index of the next top-level field line after `start`, or the line count.
fn end_of_field(lines: &[String], start: usize) -> usize {
    for (i, line) in lines.iter().enumerate().skip(start + 1) {
        if is_top_level_field(line) {
            return i;
        }
    }
    lines.len()
}

/// Strips every blank line, then re-emits exactly one blank line after a
/// top-level field's block if and only if another top-level field follows.
/// Idempotent.
pub fn normalize_blank_lines(lines: &[String]) -> Vec<String> {
    let mut result = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        if is_blank(line) {
            i += 1;
            continue;
        }

        result.push(line.clone());

        if is_top_level_field(line) {
            // Collect the field's indented block, dropping interior blanks.
            let mut end = i;
            for j in i + 1..lines.len() {
                if is_blank(&lines[j]) {
                    continue;
                }
                if is_indented(&lines[j]) {
                    end = j;
                } else {
                    break;
                }
            }
            for j in i + 1..=end {
                if !is_blank(&lines[j]) && is_indented(&lines[j]) {
                    result.push(lines[j].clone());
                }
            }

            let has_next_field = lines[end + 1..]
                .iter()
                .filter(|l| !is_blank(l))
                .any(|l| is_top_level_field(l));
            if has_next_field {
                result.push(String::new());
            }

            i = end + 1;
        } else {
            i += 1;
        }
    }

    result
}

/// Renders a field as YAML lines: sequences as `- item` per line, one-level
/// mappings as indented `key: value` lines, scalars inline with the key.
pub fn format_field_as_yaml(field: &str, value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => {
            let mut lines = vec![format!("{field}:")];
            for item in items {
                lines.push(format!("  - {}", scalar_to_string(item)));
            }
            lines
        }
        Value::Mapping(map) => {
            let mut lines = vec![format!("{field}:")];
            for (key, val) in map {
                lines.push(format!("  {}: {}", scalar_to_string(key), scalar_to_string(val)));
            }
            lines
        }
        scalar => vec![format!("{field}: {}", quote_if_needed(scalar))],
    }
}

/// Replaces only the value portion of a single `key: value` line, preserving
/// indentation and the key token. Returns `None` when no eligible line
/// exists, signalling the caller to fall back to full re-serialization.
pub fn patch_scalar_line(text: &str, key: &str, value: &Value) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut patched: Vec<String> = lines.iter().map(|l| (*l).to_string()).collect();

    for (i, line) in lines.iter().enumerate() {
        if is_comment(line) || is_indented(line) {
            continue;
        }
        let rest = match line.strip_prefix(key) {
            Some(rest) => rest,
            None => continue,
        };
        let after_key = rest.trim_start();
        if !after_key.starts_with(':') {
            continue;
        }
        // A bare `key:` opens a block; replacing it inline would orphan the
        // children below it.
        if after_key[1..].trim().is_empty() {
            return None;
        }

        // Everything up to and including the colon plus following spaces is
        // the prefix to keep.
        let value_offset = line.len() - after_key.len() + 1;
        let value_part = &line[value_offset..];
        let kept = value_part.len() - value_part.trim_start().len();
        let prefix = &line[..value_offset + kept];

        let formatted = match value {
            Value::String(s) if s.contains(' ') => format!("\"{s}\""),
            other => scalar_to_string(other),
        };
        patched[i] = format!("{prefix}{formatted}");
        return Some(join_lines(&patched));
    }

    None
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        // Nested containers are not formatted inline; the caller falls back
        // to full re-serialization for those shapes.
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim_end()
            .to_string(),
    }
}

/// Quotes a scalar when rendering it next to a key would change its parse:
/// strings containing a space or colon.
fn quote_if_needed(value: &Value) -> String {
    match value {
        Value::String(s) if s.contains(' ') || s.contains(':') => format!("\"{s}\""),
        other => scalar_to_string(other),
    }
}

pub fn join_lines(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
