use crate::error::{Result, TranslateError};
use crate::types::TransformConfig;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use regex::Regex;
use serde_json::{Map, Value};

// XML `Name` production, without the rarely used non-letter Unicode ranges
static XML_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}_:][\p{L}\p{N}\p{Mn}\p{Mc}_:.\-\u{B7}]*$").unwrap()
});

/// Serialize a tree with the default configuration
pub fn serialize_xml(tree: &Value) -> Result<String> {
    serialize_xml_with(tree, &TransformConfig::default())
}

/// Serialize `{ rootName: tree }` as an indented XML document.
///
/// Each top-level key becomes one element, in key order. Keys that are not
/// valid XML names, or nesting deeper than `config.max_depth`, are errors.
pub fn serialize_xml_with(tree: &Value, config: &TransformConfig) -> Result<String> {
    let Value::Object(top) = tree else {
        return Err(TranslateError::Xml("only an object can be written as a document".to_string()));
    };

    let mut writer = if config.indent > 0 {
        Writer::new_with_indent(Vec::new(), b' ', config.indent)
    } else {
        Writer::new(Vec::new())
    };

    for (name, value) in top {
        write_element(&mut writer, name, value, config, 1)?;
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| TranslateError::Xml(format!("invalid UTF-8 in output: {}", e)))
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &Value,
    config: &TransformConfig,
    depth: usize,
) -> Result<()> {
    if depth > config.max_depth {
        return Err(TranslateError::Xml("document nested too deeply".to_string()));
    }
    check_name(name, "element")?;

    match value {
        Value::Object(obj) => write_object(writer, name, obj, config, depth),
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item, config, depth)?;
            }
            Ok(())
        }
        Value::Null => {
            writer.write_event(Event::Empty(BytesStart::new(name)))?;
            Ok(())
        }
        Value::String(s) if s.is_empty() => {
            writer.write_event(Event::Empty(BytesStart::new(name)))?;
            Ok(())
        }
        scalar => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            writer.write_event(Event::Text(BytesText::new(&scalar_text(scalar))))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
            Ok(())
        }
    }
}

fn write_object(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    obj: &Map<String, Value>,
    config: &TransformConfig,
    depth: usize,
) -> Result<()> {
    let mut start = BytesStart::new(name);
    let mut text = None;
    let mut children = Vec::new();

    for (key, value) in obj {
        if let Some(attr) = key.strip_prefix(config.attribute_prefix.as_str()) {
            if !config.attribute_prefix.is_empty() && !value.is_object() && !value.is_array() {
                check_name(attr, "attribute")?;
                start.push_attribute((attr, scalar_text(value).as_str()));
                continue;
            }
        }
        if *key == config.text_key && !value.is_object() && !value.is_array() {
            text = Some(scalar_text(value));
            continue;
        }
        children.push((key, value));
    }

    let text = text.filter(|t| !t.is_empty());
    if children.is_empty() && text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = text {
        writer.write_event(Event::Text(BytesText::new(&text)))?;
    }
    for (key, value) in children {
        write_element(writer, key, value, config, depth + 1)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn check_name(name: &str, kind: &str) -> Result<()> {
    if XML_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(TranslateError::Xml(format!("invalid {} name {:?}", kind, name)))
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
