use crate::error::{Result, TranslateError};
use crate::types::TransformConfig;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use tracing::debug;

/// An element that has been opened but not yet closed
struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

/// Parse an XML document with the default configuration
pub fn parse_xml(xml: &str) -> Result<Value> {
    parse_xml_with(xml, &TransformConfig::default())
}

/// Parse an XML document into `{ rootName: tree }`.
///
/// Repeated sibling elements overwrite each other; the last one is kept.
/// Documents nested deeper than `config.max_depth` elements are rejected.
pub fn parse_xml_with(xml: &str, config: &TransformConfig) -> Result<Value> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if stack.is_empty() && root.is_some() {
                    return Err(TranslateError::Xml("multiple root elements".to_string()));
                }
                check_depth(stack.len(), config)?;
                stack.push(open_frame(&e, config)?);
            }
            Event::Empty(e) => {
                check_depth(stack.len(), config)?;
                let frame = open_frame(&e, config)?;
                let (name, value) = close_frame(frame, config);
                attach(&mut stack, &mut root, name, value)?;
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| TranslateError::Xml("unexpected closing tag".to_string()))?;
                let (name, value) = close_frame(frame, config);
                attach(&mut stack, &mut root, name, value)?;
            }
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(text.as_ref()));
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(data.as_ref()));
                }
            }
            Event::GeneralRef(reference) => {
                if let Some(frame) = stack.last_mut() {
                    let name = String::from_utf8_lossy(reference.as_ref()).into_owned();
                    frame.text.push_str(&resolve_reference(&name)?);
                }
            }
            Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if let Some(open) = stack.last() {
        return Err(TranslateError::Xml(format!("unclosed element <{}>", open.name)));
    }

    let (name, value) = root.ok_or_else(|| TranslateError::Xml("document has no root element".to_string()))?;
    debug!(root = %name, "parsed XML document");

    let mut doc = Map::new();
    doc.insert(name, value);
    Ok(Value::Object(doc))
}

/// The tree under a document's single outermost key.
///
/// A document whose root holds plain text has no fields, so it yields an
/// empty object.
pub fn strip_root(doc: Value) -> Result<Value> {
    let Value::Object(obj) = doc else {
        return Err(TranslateError::Xml("document is not an element tree".to_string()));
    };
    match obj.into_iter().next() {
        Some((_, inner @ Value::Object(_))) => Ok(inner),
        Some(_) => Ok(Value::Object(Map::new())),
        None => Err(TranslateError::Xml("document has no root element".to_string())),
    }
}

fn check_depth(open: usize, config: &TransformConfig) -> Result<()> {
    if open >= config.max_depth {
        return Err(TranslateError::Xml("document nested too deeply".to_string()));
    }
    Ok(())
}

fn open_frame(start: &BytesStart, config: &TransformConfig) -> Result<Frame> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut children = Map::new();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| TranslateError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref());
        let raw = String::from_utf8_lossy(&attr.value);
        let value = unescape(&raw).map_err(|e| TranslateError::Xml(e.to_string()))?;
        children.insert(
            format!("{}{}", config.attribute_prefix, key),
            Value::String(value.into_owned()),
        );
    }

    Ok(Frame {
        name,
        children,
        text: String::new(),
    })
}

fn close_frame(frame: Frame, config: &TransformConfig) -> (String, Value) {
    let Frame {
        name,
        mut children,
        text,
    } = frame;
    let text = text.trim();

    if children.is_empty() {
        return (name, Value::String(text.to_string()));
    }
    if !text.is_empty() {
        children.insert(config.text_key.clone(), Value::String(text.to_string()));
    }
    (name, Value::Object(children))
}

fn attach(
    stack: &mut [Frame],
    root: &mut Option<(String, Value)>,
    name: String,
    value: Value,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.insert(name, value);
        }
        None => {
            if root.is_some() {
                return Err(TranslateError::Xml("multiple root elements".to_string()));
            }
            *root = Some((name, value));
        }
    }
    Ok(())
}

/// Expand `&name;` or `&#NN;` / `&#xNN;`
fn resolve_reference(name: &str) -> Result<String> {
    if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        return parsed
            .and_then(char::from_u32)
            .map(|c| c.to_string())
            .ok_or_else(|| TranslateError::Xml(format!("invalid character reference &{};", name)));
    }

    resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| TranslateError::Xml(format!("unknown entity &{};", name)))
}
