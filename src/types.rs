use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Deepest element nesting read, built or written; matches serde_json's recursion limit
pub const MAX_DEPTH: usize = 128;

/// Dot-joined leaf paths (without the document root) mapped to scalar values
pub type FlatTable = Map<String, Value>;

/// Target side of one mapping entry
#[derive(Debug, Clone, PartialEq)]
pub enum MappingTarget {
    /// A usable dotted target path, root segment included
    Path(String),
    /// Anything that is not a non-empty string; kept so callers can report it
    Invalid(Value),
}

impl MappingTarget {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) if !s.is_empty() => MappingTarget::Path(s),
            other => MappingTarget::Invalid(other),
        }
    }

    pub fn as_path(&self) -> Option<&str> {
        match self {
            MappingTarget::Path(p) => Some(p),
            MappingTarget::Invalid(_) => None,
        }
    }
}

/// Source path to target path table, in the order the entries were declared
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingTable {
    entries: Vec<(String, MappingTarget)>,
}

impl MappingTable {
    pub fn new() -> Self {
        MappingTable::default()
    }

    /// Append an entry. A repeated source path replaces the earlier target in place.
    pub fn insert(&mut self, source: impl Into<String>, target: MappingTarget) {
        let source = source.into();
        if let Some(slot) = self.entries.iter_mut().find(|(s, _)| *s == source) {
            slot.1 = target;
        } else {
            self.entries.push((source, target));
        }
    }

    /// Build a table from a JSON object; members are tagged individually
    pub fn from_object(obj: Map<String, Value>) -> Self {
        // Object keys are already unique
        let entries = obj
            .into_iter()
            .map(|(source, target)| (source, MappingTarget::from_value(target)))
            .collect();
        MappingTable { entries }
    }

    pub fn entries(&self) -> &[(String, MappingTarget)] {
        &self.entries
    }

    /// Entries whose target is a usable path
    pub fn valid_paths(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(source, target)| target.as_path().map(|t| (source.as_str(), t)))
    }

    pub fn invalid_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, t)| matches!(t, MappingTarget::Invalid(_)))
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render back to a JSON object, invalid targets included verbatim
    pub fn to_value(&self) -> Value {
        let obj = self
            .entries
            .iter()
            .map(|(source, target)| {
                let value = match target {
                    MappingTarget::Path(p) => Value::String(p.clone()),
                    MappingTarget::Invalid(v) => v.clone(),
                };
                (source.clone(), value)
            })
            .collect();
        Value::Object(obj)
    }
}

/// Configuration for the transform pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Root element used when none can be read from the target schema
    pub fallback_root: String,

    /// Spaces per nesting level in serialized XML
    pub indent: usize,

    /// Key prefix marking XML attributes inside a tree
    pub attribute_prefix: String,

    /// Key holding element text when it sits next to child elements
    pub text_key: String,

    /// Deepest element nesting accepted when reading or writing XML
    pub max_depth: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            fallback_root: String::from(crate::schema::DEFAULT_ROOT_NAME),
            indent: 2,
            attribute_prefix: String::from("@_"),
            text_key: String::from("#text"),
            max_depth: MAX_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_target_tagging() {
        assert_eq!(
            MappingTarget::from_value(json!("Root.A")),
            MappingTarget::Path("Root.A".to_string())
        );
        assert!(matches!(MappingTarget::from_value(json!("")), MappingTarget::Invalid(_)));
        assert!(matches!(MappingTarget::from_value(json!(null)), MappingTarget::Invalid(_)));
        assert!(matches!(MappingTarget::from_value(json!(123)), MappingTarget::Invalid(_)));
    }

    #[test]
    fn test_table_keeps_declaration_order() {
        let obj = json!({"z": "R.Z", "a": "R.A", "m": null});
        let table = MappingTable::from_object(obj.as_object().unwrap().clone());

        let sources: Vec<&str> = table.entries().iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(sources, vec!["z", "a", "m"]);
        assert_eq!(table.valid_paths().count(), 2);
        assert_eq!(table.invalid_count(), 1);
        assert_eq!(table.to_value(), obj);
    }

    #[test]
    fn test_from_object_keeps_every_member() {
        let obj: Map<String, Value> = (0..500)
            .map(|i| (format!("f{}", i), json!(format!("R.F{}", i))))
            .collect();

        let table = MappingTable::from_object(obj);

        assert_eq!(table.len(), 500);
        assert_eq!(table.entries()[0].0, "f0");
        assert_eq!(table.entries()[499].1.as_path(), Some("R.F499"));
    }

    #[test]
    fn test_insert_replaces_existing_source() {
        let mut table = MappingTable::new();
        table.insert("a", MappingTarget::Path("R.A".into()));
        table.insert("b", MappingTarget::Path("R.B".into()));
        table.insert("a", MappingTarget::Path("R.C".into()));

        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[0].1.as_path(), Some("R.C"));
    }
}
