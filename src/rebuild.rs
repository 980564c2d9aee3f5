//! Rebuilding nested trees from a mapping table and a flat source table

use crate::types::{FlatTable, MappingTable, MappingTarget, MAX_DEPTH};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Build a nested tree from `mapping`, pulling leaf values out of `flat`.
///
/// Every target path has its first segment replaced by `root_name` (or kept,
/// when `root_name` is `None`), so all leaves gather under one root. Entries
/// whose target is not a non-empty string, or has no segments once empty
/// ones are dropped, are skipped. Missing source paths produce `""`.
///
/// If an entry needs to descend through a slot an earlier entry set as a
/// scalar, the scalar is replaced by an empty object. Entries are applied in
/// table order. Targets with more than [`MAX_DEPTH`] segments are skipped.
pub fn rebuild(mapping: &MappingTable, flat: &FlatTable, root_name: Option<&str>) -> Value {
    let mut result = Map::new();
    let mut skipped = 0usize;

    for (source, target) in mapping.entries() {
        let target_path = match target {
            MappingTarget::Path(p) => p,
            MappingTarget::Invalid(v) => {
                debug!(source = %source, target = %v, "skipping mapping entry with non-string target");
                skipped += 1;
                continue;
            }
        };

        let segments: Vec<&str> = target_path.split('.').filter(|s| !s.is_empty()).collect();
        let Some((declared_root, inner)) = segments.split_first() else {
            warn!(source = %source, target = %target_path, "skipping mapping entry with empty target path");
            skipped += 1;
            continue;
        };
        if segments.len() > MAX_DEPTH {
            warn!(source = %source, segments = segments.len(), "skipping mapping entry nested too deeply");
            skipped += 1;
            continue;
        }

        let value = lookup(flat, source);
        let root_key = root_name.filter(|r| !r.is_empty()).unwrap_or(*declared_root);

        let Some(root) = ensure_object(&mut result, root_key) else {
            continue;
        };
        place(root, inner, value);
    }

    debug!(
        entries = mapping.len(),
        skipped,
        "rebuilt tree from mapping table"
    );

    Value::Object(result)
}

/// Value for a source path, or `""` when the source document lacked it
fn lookup(flat: &FlatTable, source: &str) -> Value {
    match flat.get(source) {
        Some(Value::Null) | None => Value::String(String::new()),
        Some(v) => v.clone(),
    }
}

/// Walk `segments` below `node`, creating objects as needed, and set the last one to `value`
fn place(node: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };

    let mut current = node;
    for seg in parents {
        let Some(next) = ensure_object(current, seg) else {
            return;
        };
        current = next;
    }
    current.insert((*leaf).to_string(), value);
}

/// Get the object under `key`, replacing whatever non-object value sat there
fn ensure_object<'a>(node: &'a mut Map<String, Value>, key: &str) -> Option<&'a mut Map<String, Value>> {
    let slot = node.entry(key.to_string()).or_insert(Value::Null);
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::mapping::parse_mapping;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn table(value: Value) -> MappingTable {
        MappingTable::from_object(value.as_object().unwrap().clone())
    }

    fn flat(value: Value) -> FlatTable {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_basic_rebuild() {
        let mapping = table(json!({
            "customerId": "CustomerRequest.CustID",
            "name": "CustomerRequest.BasicInfo.Name"
        }));
        let flat = flat(json!({"customerId": "C-1", "name": "Alice"}));

        let tree = rebuild(&mapping, &flat, None);

        assert_eq!(
            tree,
            json!({"CustomerRequest": {"CustID": "C-1", "BasicInfo": {"Name": "Alice"}}})
        );
    }

    #[test]
    fn test_identity_round_trip() {
        let source = json!({
            "id": "7",
            "customer": {"name": "Alice", "address": {"city": "Springfield"}}
        });
        let mapping = table(json!({
            "id": "Doc.id",
            "customer.name": "Doc.customer.name",
            "customer.address.city": "Doc.customer.address.city"
        }));

        let tree = rebuild(&mapping, &flatten(&source), Some("Doc"));

        assert_eq!(tree, json!({"Doc": source}));
    }

    #[test]
    fn test_identity_restricted_to_mapped_leaves() {
        let source = json!({"a": "1", "b": {"c": "2", "d": "3"}});
        let mapping = table(json!({"b.c": "R.b.c"}));

        let tree = rebuild(&mapping, &flatten(&source), Some("R"));

        assert_eq!(tree, json!({"R": {"b": {"c": "2"}}}));
    }

    #[test]
    fn test_missing_source_defaults_to_empty_string() {
        let mapping = table(json!({"missing": "Root.Field"}));

        let tree = rebuild(&mapping, &FlatTable::new(), None);

        assert_eq!(tree, json!({"Root": {"Field": ""}}));
    }

    #[test]
    fn test_null_source_defaults_to_empty_string() {
        let mapping = table(json!({"a": "Root.A"}));

        let tree = rebuild(&mapping, &flat(json!({"a": null})), None);

        assert_eq!(tree, json!({"Root": {"A": ""}}));
    }

    #[test]
    fn test_non_string_scalars_are_kept() {
        let mapping = table(json!({"n": "Root.N", "b": "Root.B"}));

        let tree = rebuild(&mapping, &flat(json!({"n": 5, "b": false})), None);

        assert_eq!(tree, json!({"Root": {"N": 5, "B": false}}));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let mapping = table(json!({
            "a": null,
            "b": "",
            "c": 123,
            "d": "Root.D"
        }));
        let flat = flat(json!({"a": "1", "b": "2", "c": "3", "d": "4"}));

        let tree = rebuild(&mapping, &flat, None);

        assert_eq!(tree, json!({"Root": {"D": "4"}}));
    }

    #[test]
    fn test_dots_only_target_is_skipped() {
        let mapping = table(json!({"a": "...", "b": "Root.B"}));

        let tree = rebuild(&mapping, &flat(json!({"a": "1", "b": "2"})), None);

        assert_eq!(tree, json!({"Root": {"B": "2"}}));
    }

    #[test]
    fn test_conflict_scalar_overwritten_by_node() {
        let mapping = table(json!({"x": "Root.A", "y": "Root.A.B"}));

        let tree = rebuild(&mapping, &flat(json!({"x": "1", "y": "2"})), None);

        assert_eq!(tree, json!({"Root": {"A": {"B": "2"}}}));
    }

    #[test]
    fn test_conflict_node_overwritten_by_later_scalar() {
        let mapping = table(json!({"y": "Root.A.B", "x": "Root.A"}));

        let tree = rebuild(&mapping, &flat(json!({"x": "1", "y": "2"})), None);

        assert_eq!(tree, json!({"Root": {"A": "1"}}));
    }

    #[test]
    fn test_root_substitution() {
        let mapping = table(json!({"p": "Foo.P", "q": "Bar.Q"}));

        let tree = rebuild(&mapping, &flat(json!({"p": "1", "q": "2"})), Some("Quote"));

        assert_eq!(tree, json!({"Quote": {"P": "1", "Q": "2"}}));
    }

    #[test]
    fn test_without_root_name_keeps_declared_roots() {
        let mapping = table(json!({"p": "Foo.P", "q": "Bar.Q"}));

        let tree = rebuild(&mapping, &flat(json!({"p": "1", "q": "2"})), None);

        assert_eq!(tree, json!({"Foo": {"P": "1"}, "Bar": {"Q": "2"}}));
    }

    #[test]
    fn test_deep_nesting() {
        let mapping = table(json!({"v": "Root.A.B.C.D"}));

        let tree = rebuild(&mapping, &flat(json!({"v": "deep"})), None);

        assert_eq!(tree, json!({"Root": {"A": {"B": {"C": {"D": "deep"}}}}}));
        assert_eq!(tree.pointer("/Root/A/B/C/D"), Some(&json!("deep")));
    }

    #[test]
    fn test_root_only_target_creates_empty_root() {
        let mapping = table(json!({"v": "Root"}));

        let tree = rebuild(&mapping, &flat(json!({"v": "x"})), Some("Out"));

        assert_eq!(tree, json!({"Out": {}}));
    }

    #[test]
    fn test_empty_segments_are_ignored() {
        let mapping = table(json!({"v": ".Root..A."}));

        let tree = rebuild(&mapping, &flat(json!({"v": "x"})), None);

        assert_eq!(tree, json!({"Root": {"A": "x"}}));
    }

    #[test]
    fn test_overly_deep_target_is_skipped() {
        let deep = format!("Root.{}", vec!["A"; MAX_DEPTH + 10].join("."));
        let mapping = table(json!({"v": deep, "w": "Root.W"}));

        let tree = rebuild(&mapping, &flat(json!({"v": "x", "w": "y"})), None);

        assert_eq!(tree, json!({"Root": {"W": "y"}}));
    }

    #[test]
    fn test_conflict_repeated_at_several_levels() {
        let mapping = table(json!({
            "a": "Root.A",
            "b": "Root.A.B",
            "c": "Root.A.B.C"
        }));

        let tree = rebuild(&mapping, &flat(json!({"a": "1", "b": "2", "c": "3"})), None);

        assert_eq!(tree, json!({"Root": {"A": {"B": {"C": "3"}}}}));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unusable_targets_warn_once() {
        let captured = CapturedLogs::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mapping = parse_mapping(r#"{"a": null, "b": 123, "c": "Root.C"}"#).unwrap();
            rebuild(&mapping, &FlatTable::new(), None);
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(logs.matches("WARN").count(), 1, "{}", logs);
        assert!(logs.contains("mapping contains unusable targets"));
    }

    #[test]
    fn test_empty_mapping() {
        let tree = rebuild(&MappingTable::new(), &flat(json!({"a": "1"})), Some("Root"));

        assert_eq!(tree, json!({}));
    }
}
