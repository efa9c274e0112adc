// Form renderer: walks the structured model and emits one input descriptor
// per scalar leaf and one editable summary per nested object/array. Each
// descriptor carries the dotted path the UI wires its control to.

use serde::Serialize;
use serde_yaml::Value;

use super::fields;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Control {
    Select {
        options: Vec<String>,
        selected: String,
    },
    Number {
        value: f64,
    },
    Checkbox {
        checked: bool,
    },
    Text {
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum FormEntry {
    /// A single scalar input control.
    Input {
        key: String,
        label: String,
        path: String,
        control: Control,
        #[serde(skip_serializing_if = "Option::is_none")]
        help: Option<String>,
    },
    /// A nested object/array rendered as an editable summary.
    Group {
        key: String,
        label: String,
        path: String,
        summary: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        help: Option<String>,
    },
    /// One element of a sequence, with its own nested entries.
    Item {
        index: usize,
        path: String,
        summary: String,
        entries: Vec<FormEntry>,
    },
    /// Trailing add-item affordance for a sequence.
    AddItem {
        path: String,
        label: String,
        template: Value,
    },
}

fn label_for(key: &str) -> String {
    key.replace('_', " ")
}

fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}

/// Summary line for a nested value: item count for sequences, field count
/// plus the first few key names for mappings.
pub fn summarize(value: &Value) -> String {
    match value {
        Value::Sequence(items) => {
            if items.is_empty() {
                "Empty".to_string()
            } else if items.len() == 1 {
                "1 item".to_string()
            } else {
                format!("{} items", items.len())
            }
        }
        Value::Mapping(map) => {
            if map.is_empty() {
                return "Empty".to_string();
            }
            let keys: Vec<&str> = map
                .keys()
                .filter_map(|k| k.as_str())
                .collect();
            let shown = keys.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
            let ellipsis = if keys.len() > 3 { "..." } else { "" };
            let noun = if keys.len() == 1 { "field" } else { "fields" };
            format!("{} {noun}: {shown}{ellipsis}", keys.len())
        }
        _ => String::new(),
    }
}

fn scalar_control(key: &str, value: &Value) -> Control {
    if let Value::Bool(b) = value {
        return Control::Checkbox { checked: *b };
    }

    if let Value::String(s) = value {
        if let Some(options) = fields::select_options(key) {
            return Control::Select {
                options: options.iter().map(|o| (*o).to_string()).collect(),
                selected: s.clone(),
            };
        }
    }

    if let Value::Number(n) = value {
        return Control::Number {
            value: n.as_f64().unwrap_or(0.0),
        };
    }

    let text = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    };
    Control::Text {
        value: text,
        placeholder: fields::placeholder(key).map(str::to_string),
    }
}

fn input_entry(key: &str, value: &Value, path: String) -> FormEntry {
    FormEntry::Input {
        key: key.to_string(),
        label: label_for(key),
        path,
        control: scalar_control(key, value),
        help: fields::help_text(key).map(str::to_string),
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

fn add_item_label(parent_path: &str) -> String {
    match last_segment(parent_path) {
        "commands" => "Add Command",
        "env" => "Add Environment Variable",
        "ports" => "Add Port",
        "rate_limits" => "Add Rate Limit",
        _ => "Add Item",
    }
    .to_string()
}

/// Builds the form for `value`, one entry per direct child. Nested
/// containers become summaries; sequences expand into items plus an
/// add-item affordance.
pub fn render_form(value: &Value, parent_path: &str) -> Vec<FormEntry> {
    let mut entries = Vec::new();

    match value {
        Value::Sequence(items) => {
            for (index, item) in items.iter().enumerate() {
                let item_path = join_path(parent_path, &index.to_string());
                let nested = if matches!(item, Value::Mapping(_) | Value::Sequence(_)) {
                    render_form(item, &item_path)
                } else {
                    vec![input_entry("value", item, item_path.clone())]
                };
                entries.push(FormEntry::Item {
                    index,
                    path: item_path,
                    summary: summarize(item),
                    entries: nested,
                });
            }
            entries.push(FormEntry::AddItem {
                path: parent_path.to_string(),
                label: add_item_label(parent_path),
                template: fields::array_item_template(last_segment(parent_path)),
            });
        }
        Value::Mapping(map) => {
            for (key, child) in map {
                let key = match key.as_str() {
                    Some(key) => key,
                    None => continue,
                };
                let path = join_path(parent_path, key);
                match child {
                    Value::Mapping(_) | Value::Sequence(_) => {
                        entries.push(FormEntry::Group {
                            key: key.to_string(),
                            label: label_for(key),
                            path,
                            summary: summarize(child),
                            help: fields::help_text(key).map(str::to_string),
                        });
                    }
                    scalar => entries.push(input_entry(key, scalar, path)),
                }
            }
        }
        scalar => entries.push(input_entry("value", scalar, parent_path.to_string())),
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_scalar_leaves_become_inputs() {
        let model = parse("type: task\nname: demo");
        let entries = render_form(&model, "");
        assert_eq!(entries.len(), 2);
        match &entries[0] {
            FormEntry::Input { key, path, control, .. } => {
                assert_eq!(key, "type");
                assert_eq!(path, "type");
                assert!(matches!(control, Control::Select { selected, .. } if selected == "task"));
            }
            other => panic!("expected input, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_mapping_becomes_group_summary() {
        let model = parse("resources:\n  gpu: 24GB\n  memory: 16GB\n  cpu: 4\n  disk: 1TB");
        let entries = render_form(&model, "");
        match &entries[0] {
            FormEntry::Group { summary, path, .. } => {
                assert_eq!(path, "resources");
                assert_eq!(summary, "4 fields: gpu, memory, cpu...");
            }
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn test_sequence_renders_items_and_add_button() {
        let model = parse("- A=1\n- B=2");
        let entries = render_form(&model, "env");
        assert_eq!(entries.len(), 3);
        match &entries[0] {
            FormEntry::Item { path, entries, .. } => {
                assert_eq!(path, "env.0");
                assert!(matches!(&entries[0], FormEntry::Input { key, .. } if key == "value"));
            }
            other => panic!("expected item, got {other:?}"),
        }
        match &entries[2] {
            FormEntry::AddItem { label, template, .. } => {
                assert_eq!(label, "Add Environment Variable");
                assert_eq!(template, &Value::String("KEY=value".into()));
            }
            other => panic!("expected add-item, got {other:?}"),
        }
    }

    #[test]
    fn test_boolean_renders_checkbox() {
        let model = parse("nvcc: true");
        let entries = render_form(&model, "");
        assert!(matches!(
            &entries[0],
            FormEntry::Input { control: Control::Checkbox { checked: true }, .. }
        ));
    }

    #[test]
    fn test_numeric_field_control() {
        let model = parse("replicas: 3");
        let entries = render_form(&model, "");
        assert!(matches!(
            &entries[0],
            FormEntry::Input { control: Control::Number { value }, .. } if *value == 3.0
        ));
    }

    #[test]
    fn test_summaries() {
        assert_eq!(summarize(&parse("[]")), "Empty");
        assert_eq!(summarize(&parse("- a")), "1 item");
        assert_eq!(summarize(&parse("- a\n- b")), "2 items");
        assert_eq!(summarize(&parse("a: 1")), "1 field: a");
    }
}
