// The edited YAML document: structured model, displayed text, collapse
// state and the original-content snapshot behind one API.
//
// Convergence invariant: after every mutating call,
// `parse(strip_markers(text))` equals the model. The text itself is only
// best-effort byte-stable (targeted patches for single top-level scalars);
// every other edit shape falls back to full re-serialization, which drops
// hand-authored comments and layout.

pub mod collapse;
pub mod fields;
pub mod form;
pub mod path;
pub mod text_editor;

use std::collections::HashSet;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{EditorError, Result};

pub use form::{Control, FormEntry};
pub use text_editor::FieldRange;

#[derive(Debug, Clone)]
struct Snapshot {
    content: String,
    sections: Vec<collapse::Section>,
}

#[derive(Debug, Clone)]
pub struct Document {
    model: Value,
    text: String,
    collapsed: HashSet<String>,
    snapshot: Option<Snapshot>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            model: Value::Mapping(Mapping::new()),
            text: String::new(),
            collapsed: HashSet::new(),
            snapshot: None,
        }
    }

    /// Replaces the whole document with new content. Resets the collapsed
    /// set: collapse state names keys in the previous document and carrying
    /// it across a replacement would hide unrelated sections.
    pub fn load(&mut self, content: &str) -> Result<()> {
        self.collapsed.clear();
        self.set_text(content)
    }

    /// Adopts edited text coming from the raw-text view. On a parse failure
    /// the last-good model is retained and the error is surfaced; editing is
    /// not blocked.
    pub fn set_text(&mut self, content: &str) -> Result<()> {
        let clean = collapse::strip_markers(content);
        if clean.trim().is_empty() {
            self.model = Value::Mapping(Mapping::new());
            self.adopt_text(String::new());
            return Ok(());
        }

        let parsed: Value = serde_yaml::from_str(&clean)?;
        self.model = parsed;
        self.adopt_text(clean);
        Ok(())
    }

    /// The displayed text, markers included.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The authoritative text. Collapsed sections hide lines in the display,
    /// so the snapshot content is the source of truth; the displayed text is
    /// only a fallback when no snapshot exists yet. This is what gets
    /// persisted or re-parsed.
    pub fn clean_text(&self) -> String {
        match &self.snapshot {
            Some(snapshot) => snapshot.content.clone(),
            None => collapse::strip_markers(&self.text),
        }
    }

    pub fn model(&self) -> &Value {
        &self.model
    }

    pub fn is_empty(&self) -> bool {
        match &self.model {
            Value::Mapping(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    /// Form descriptors for the current model.
    pub fn form(&self) -> Vec<FormEntry> {
        form::render_form(&self.model, "")
    }

    /// Known fields not yet present, in canonical order: the quick-add set.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        fields::FIELD_ORDER
            .iter()
            .copied()
            .filter(|field| path::get_nested(&self.model, field).is_none())
            .collect()
    }

    /// Writes a value at a dotted path and patches the text. Only a
    /// single-segment path to a scalar is eligible for a targeted in-place
    /// patch; everything else re-serializes the whole model.
    pub fn update_value(&mut self, dotted_path: &str, value: Value) -> Result<()> {
        path::set_nested(&mut self.model, dotted_path, value.clone());

        let targetable = !dotted_path.contains('.')
            && matches!(
                value,
                Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null
            );
        if targetable {
            let clean = self.clean_text();
            if let Some(patched) = text_editor::patch_scalar_line(&clean, dotted_path, &value) {
                self.adopt_text(patched);
                return Ok(());
            }
        }

        debug!(path = dotted_path, "targeted patch not applicable, re-serializing");
        self.reserialize()
    }

    /// Removes a value at a dotted path. Top-level keys go through the text
    /// editor's range removal; nested paths re-serialize.
    pub fn delete_value(&mut self, dotted_path: &str) -> Result<()> {
        if path::get_nested(&self.model, dotted_path).is_none() {
            return Ok(());
        }
        path::delete_nested(&mut self.model, dotted_path);

        if !dotted_path.contains('.') {
            let updated = text_editor::remove_field(&self.clean_text(), dotted_path);
            self.adopt_text(updated);
            return Ok(());
        }
        self.reserialize()
    }

    /// Adds a top-level field, positioned by the field order table. Known
    /// fields may omit the value and take their quick-add default. A field
    /// that already exists is left untouched.
    pub fn add_field(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        if path::get_nested(&self.model, name).is_some() {
            debug!(field = name, "add_field: field already present");
            return Ok(());
        }

        let value = match value.or_else(|| fields::default_value(name)) {
            Some(value) => value,
            None => {
                return Err(EditorError::ValidationError(format!(
                    "unknown field: {name}"
                )))
            }
        };

        self.insert_into_model_ordered(name, value.clone());
        let updated = text_editor::insert_field(&self.clean_text(), name, &value);
        self.adopt_text(updated);
        Ok(())
    }

    /// Removes a top-level field and its whole block. Absent fields are a
    /// no-op.
    pub fn remove_field(&mut self, name: &str) -> Result<()> {
        if path::get_nested(&self.model, name).is_none() {
            debug!(field = name, "remove_field: field not present");
            return Ok(());
        }

        path::delete_nested(&mut self.model, name);
        let updated = text_editor::remove_field(&self.clean_text(), name);
        self.adopt_text(updated);
        Ok(())
    }

    /// Flips a section's collapse state and re-renders the display from the
    /// snapshot. When no snapshot was ever captured the currently displayed
    /// text is scanned instead; that degrades gracefully but cannot recover
    /// content that was already hidden.
    pub fn toggle_section(&mut self, key: &str) {
        if !self.collapsed.remove(key) {
            self.collapsed.insert(key.to_string());
        }

        let (content, sections) = match &self.snapshot {
            Some(snapshot) => (snapshot.content.clone(), snapshot.sections.clone()),
            None => {
                let clean = self.clean_text();
                let sections = collapse::collapsible_sections(&clean);
                (clean, sections)
            }
        };
        self.text = collapse::render_collapsed(&content, &sections, &self.collapsed);
    }

    pub fn collapsed_keys(&self) -> &HashSet<String> {
        &self.collapsed
    }

    /// Keys that currently have collapsible child content.
    pub fn collapsible_keys(&self) -> Vec<String> {
        let clean = self.clean_text();
        collapse::collapsible_sections(&clean)
            .into_iter()
            .map(|s| s.key)
            .collect()
    }

    fn reserialize(&mut self) -> Result<()> {
        let dumped = serde_yaml::to_string(&self.model)?;
        let lines: Vec<String> = dumped.lines().map(str::to_string).collect();
        let normalized = text_editor::normalize_blank_lines(&lines);
        self.adopt_text(text_editor::join_lines(&normalized));
        Ok(())
    }

    /// Installs new authoritative text: recapture the snapshot, then
    /// re-derive markers for display.
    fn adopt_text(&mut self, clean: String) {
        let sections = collapse::collapsible_sections(&clean);
        self.text = collapse::add_markers(&clean, &self.collapsed);
        self.snapshot = Some(Snapshot {
            content: clean,
            sections,
        });
    }

    /// Rebuilds the model mapping with `name` inserted at its canonical
    /// position; unknown keys keep their original relative order at the end.
    fn insert_into_model_ordered(&mut self, name: &str, value: Value) {
        let current = match &self.model {
            Value::Mapping(map) => map.clone(),
            _ => Mapping::new(),
        };

        let mut ordered = Mapping::new();
        for field in fields::FIELD_ORDER {
            if *field == name {
                ordered.insert(Value::String((*field).to_string()), value.clone());
            } else if let Some(existing) = current.get(*field) {
                ordered.insert(Value::String((*field).to_string()), existing.clone());
            }
        }
        for (key, existing) in &current {
            if !ordered.contains_key(key) {
                ordered.insert(key.clone(), existing.clone());
            }
        }
        if !ordered.contains_key(name) {
            ordered.insert(Value::String(name.to_string()), value);
        }

        self.model = Value::Mapping(ordered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "type: task\nname: demo\n\nenv:\n  - A=1\n";

    fn converged(doc: &Document) -> bool {
        let clean = doc.clean_text();
        if clean.trim().is_empty() {
            return doc.is_empty();
        }
        let parsed: Value = serde_yaml::from_str(&clean).unwrap();
        parsed == *doc.model()
    }

    #[test]
    fn test_load_parses_and_marks() {
        let mut doc = Document::new();
        doc.load(SAMPLE).unwrap();
        assert!(doc.text().contains(&format!("env:{}", collapse::EXPANDED_MARKER)));
        assert_eq!(doc.clean_text(), SAMPLE);
        assert!(converged(&doc));
    }

    #[test]
    fn test_load_clears_collapse_state() {
        let mut doc = Document::new();
        doc.load(SAMPLE).unwrap();
        doc.toggle_section("env");
        assert!(!doc.collapsed_keys().is_empty());

        doc.load("commands:\n  - ls\n").unwrap();
        assert!(doc.collapsed_keys().is_empty());
    }

    #[test]
    fn test_targeted_patch_preserves_comments() {
        let text = "# deployment config\ntype: task\nname: demo\n";
        let mut doc = Document::new();
        doc.load(text).unwrap();
        doc.update_value("name", Value::String("renamed".into())).unwrap();

        assert!(doc.clean_text().contains("# deployment config"));
        assert!(doc.clean_text().contains("name: renamed"));
        assert!(converged(&doc));
    }

    #[test]
    fn test_targeted_patch_quotes_value_with_space() {
        let mut doc = Document::new();
        doc.load(SAMPLE).unwrap();
        doc.update_value("name", Value::String("demo two".into())).unwrap();

        assert!(doc.clean_text().contains("name: \"demo two\""));
        assert_eq!(
            doc.model()["name"],
            Value::String("demo two".into())
        );
        assert!(converged(&doc));
    }

    #[test]
    fn test_nested_update_falls_back_to_reserialization() {
        let text = "# comment lost on fallback\nname: demo\nresources:\n  gpu: 24GB\n";
        let mut doc = Document::new();
        doc.load(text).unwrap();
        doc.update_value("resources.gpu", Value::String("80GB".into())).unwrap();

        assert!(!doc.clean_text().contains("# comment lost on fallback"));
        assert_eq!(doc.model()["resources"]["gpu"], Value::String("80GB".into()));
        assert!(converged(&doc));
    }

    #[test]
    fn test_remove_then_add_field_scenario() {
        let mut doc = Document::new();
        doc.load(SAMPLE).unwrap();
        doc.remove_field("env").unwrap();
        assert!(doc.model().get("env").is_none());

        let value = Value::Sequence(vec![Value::String("B=2".into())]);
        doc.add_field("env", Some(value.clone())).unwrap();

        assert_eq!(doc.model()["env"], value);
        assert_eq!(doc.model()["type"], Value::String("task".into()));
        assert_eq!(doc.model()["name"], Value::String("demo".into()));
        assert!(converged(&doc));

        let clean = doc.clean_text();
        let lines: Vec<&str> = clean.lines().collect();
        let name_idx = lines.iter().position(|l| l.starts_with("name:")).unwrap();
        let env_idx = lines.iter().position(|l| l.starts_with("env:")).unwrap();
        assert_eq!(env_idx - name_idx, 2);
        assert!(lines[name_idx + 1].trim().is_empty());
    }

    #[test]
    fn test_add_field_uses_quick_add_default() {
        let mut doc = Document::new();
        doc.load("type: task\nname: demo\n").unwrap();
        doc.add_field("ports", None).unwrap();

        assert_eq!(
            doc.model()["ports"],
            Value::Sequence(vec![Value::Number(8000.into())])
        );
        assert!(converged(&doc));
    }

    #[test]
    fn test_add_existing_field_is_noop() {
        let mut doc = Document::new();
        doc.load(SAMPLE).unwrap();
        let before = doc.clean_text();
        doc.add_field("env", None).unwrap();
        assert_eq!(doc.clean_text(), before);
    }

    #[test]
    fn test_add_unknown_field_without_value_rejected() {
        let mut doc = Document::new();
        doc.load(SAMPLE).unwrap();
        assert!(doc.add_field("mystery", None).is_err());
    }

    #[test]
    fn test_collapse_toggle_round_trip() {
        let text = "type: task\nname: demo\n\nenv:\n  - A=1\n  - B=2\n";
        let mut doc = Document::new();
        doc.load(text).unwrap();
        let expanded_lines = doc.text().lines().count();

        doc.toggle_section("env");
        assert_eq!(doc.text().lines().count(), expanded_lines - 2);
        assert!(doc.text().contains(&format!("env:{}", collapse::COLLAPSED_MARKER)));

        doc.toggle_section("env");
        assert_eq!(doc.clean_text(), text);
    }

    #[test]
    fn test_markers_never_reach_clean_text() {
        let mut doc = Document::new();
        doc.load(SAMPLE).unwrap();
        doc.toggle_section("env");
        let clean = doc.clean_text();
        assert!(!clean.contains('▼') && !clean.contains('▶'));
    }

    #[test]
    fn test_parse_failure_keeps_last_good_model() {
        let mut doc = Document::new();
        doc.load(SAMPLE).unwrap();
        let model_before = doc.model().clone();

        let result = doc.set_text("type: [unclosed\n");
        assert!(matches!(result, Err(EditorError::ParseError(_))));
        assert_eq!(*doc.model(), model_before);
    }

    #[test]
    fn test_set_empty_text_clears_model() {
        let mut doc = Document::new();
        doc.load(SAMPLE).unwrap();
        doc.set_text("").unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_missing_fields_shrink_as_fields_added() {
        let mut doc = Document::new();
        doc.load("type: task\n").unwrap();
        assert!(doc.missing_fields().contains(&"env"));
        doc.add_field("env", None).unwrap();
        assert!(!doc.missing_fields().contains(&"env"));
    }
}
