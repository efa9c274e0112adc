// Collapsible-section rendering over the raw YAML text.
//
// Markers are a display-only convention: a two-character trailing arrow on a
// collapsible header line. They must be stripped before the text is parsed
// or persisted. Collapsed views are always rebuilt from the original content
// snapshot so expansion restores the exact original formatting.

use std::collections::HashSet;

pub const EXPANDED_MARKER: &str = " ▼";
pub const COLLAPSED_MARKER: &str = " ▶";

/// A collapsible key: its header line and the indices of the more-deeply
/// indented lines that belong to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub key: String,
    pub header_line: usize,
    pub child_lines: Vec<usize>,
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Scans for collapsible sections: lines whose trimmed form ends with a
/// colon, are not list items or comments, and have at least one more deeply
/// indented following line. Blank lines inside a block do not end it.
pub fn collapsible_sections(text: &str) -> Vec<Section> {
    let lines: Vec<&str> = text.lines().collect();
    let mut sections = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if !trimmed.ends_with(':') || trimmed.starts_with('-') || trimmed.starts_with('#') {
            continue;
        }

        let indent = indent_of(line);
        let mut child_lines = Vec::new();
        for (j, next) in lines.iter().enumerate().skip(i + 1) {
            if next.trim().is_empty() {
                continue;
            }
            if indent_of(next) > indent {
                child_lines.push(j);
            } else {
                break;
            }
        }

        if !child_lines.is_empty() {
            let key = trimmed.strip_suffix(':').unwrap_or(trimmed).to_string();
            sections.push(Section {
                key,
                header_line: i,
                child_lines,
            });
        }
    }

    sections
}

pub fn has_markers(text: &str) -> bool {
    text.contains(EXPANDED_MARKER) || text.contains(COLLAPSED_MARKER)
}

/// Removes every collapse marker. Safe on marker-free text.
pub fn strip_markers(text: &str) -> String {
    text.replace(EXPANDED_MARKER, "").replace(COLLAPSED_MARKER, "")
}

/// Appends a marker to every collapsible header line. A no-op when markers
/// are already present, so repeated invocation cannot duplicate them.
pub fn add_markers(text: &str, collapsed: &HashSet<String>) -> String {
    if has_markers(text) {
        return text.to_string();
    }

    let sections = collapsible_sections(text);
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    for section in &sections {
        let marker = if collapsed.contains(&section.key) {
            COLLAPSED_MARKER
        } else {
            EXPANDED_MARKER
        };
        lines[section.header_line].push_str(marker);
    }

    let mut result = lines.join("\n");
    if text.ends_with('\n') {
        result.push('\n');
    }
    result
}

/// Rewrites the display text from the snapshot: collapsed sections keep only
/// their header line (with the collapsed marker); every child line of a
/// collapsed key is omitted; all other lines pass through unchanged.
pub fn render_collapsed(
    snapshot: &str,
    sections: &[Section],
    collapsed: &HashSet<String>,
) -> String {
    let lines: Vec<&str> = snapshot.lines().collect();
    let mut display: Vec<String> = Vec::with_capacity(lines.len());

    let mut i = 0;
    while i < lines.len() {
        if let Some(section) = sections.iter().find(|s| s.header_line == i) {
            let is_collapsed = collapsed.contains(&section.key);
            let marker = if is_collapsed {
                COLLAPSED_MARKER
            } else {
                EXPANDED_MARKER
            };
            let clean = strip_markers(lines[i]);
            display.push(format!("{clean}{marker}"));

            if !is_collapsed {
                for &child in &section.child_lines {
                    if let Some(line) = lines.get(child) {
                        display.push((*line).to_string());
                    }
                }
            }

            i = section.child_lines.last().map_or(i, |last| *last) + 1;
        } else {
            let hidden = sections
                .iter()
                .any(|s| s.child_lines.contains(&i) && collapsed.contains(&s.key));
            if !hidden {
                display.push(lines[i].to_string());
            }
            i += 1;
        }
    }

    let mut result = display.join("\n");
    if snapshot.ends_with('\n') {
        result.push('\n');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "type: task\nname: demo\n\nenv:\n  - A=1\n  - B=2\n";

    fn collapsed(keys: &[&str]) -> HashSet<String> {
        keys.iter().map(|k| (*k).to_string()).collect()
    }

    #[test]
    fn test_sections_found_with_children_only() {
        let sections = collapsible_sections(SAMPLE);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].key, "env");
        assert_eq!(sections[0].header_line, 3);
        assert_eq!(sections[0].child_lines, vec![4, 5]);
    }

    #[test]
    fn test_sections_span_interior_blank_lines() {
        let text = "commands:\n  - ls\n\n  - pwd\n";
        let sections = collapsible_sections(text);
        assert_eq!(sections[0].child_lines, vec![1, 3]);
    }

    #[test]
    fn test_nested_sections_are_collapsible() {
        let text = "resources:\n  gpu: 24GB\nmodel:\n  meta:\n    name: x\n";
        let keys: Vec<String> = collapsible_sections(text)
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(keys, vec!["resources", "model", "meta"]);
    }

    #[test]
    fn test_add_markers_idempotent() {
        let once = add_markers(SAMPLE, &HashSet::new());
        let twice = add_markers(&once, &HashSet::new());
        assert_eq!(once, twice);
        assert!(once.contains(&format!("env:{EXPANDED_MARKER}")));
    }

    #[test]
    fn test_strip_round_trip() {
        let marked = add_markers(SAMPLE, &HashSet::new());
        assert_eq!(strip_markers(&marked), SAMPLE);
    }

    #[test]
    fn test_collapse_hides_exactly_the_children() {
        let sections = collapsible_sections(SAMPLE);
        let view = render_collapsed(SAMPLE, &sections, &collapsed(&["env"]));

        let sample_lines = SAMPLE.lines().count();
        assert_eq!(view.lines().count(), sample_lines - 2);
        assert!(view.contains(&format!("env:{COLLAPSED_MARKER}")));
        assert!(!view.contains("A=1"));
        assert!(!view.contains("B=2"));
    }

    #[test]
    fn test_expand_restores_from_snapshot() {
        let sections = collapsible_sections(SAMPLE);
        let collapsed_view = render_collapsed(SAMPLE, &sections, &collapsed(&["env"]));
        assert!(!collapsed_view.contains("A=1"));

        let expanded_view = render_collapsed(SAMPLE, &sections, &HashSet::new());
        assert_eq!(strip_markers(&expanded_view), SAMPLE);
    }

    #[test]
    fn test_unrelated_lines_pass_through() {
        let text = "# a comment\ntype: task\n\nenv:\n  - A=1\n";
        let sections = collapsible_sections(text);
        let view = render_collapsed(text, &sections, &collapsed(&["env"]));
        assert!(view.contains("# a comment"));
        assert!(view.contains("type: task"));
    }
}
