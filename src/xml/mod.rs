//! XML documents as nested JSON trees
//!
//! Elements become object keys and leaf elements become string values.
//! Attributes are stored as prefixed keys (`@_id`) and text sitting next to
//! child elements goes under a text key (`#text`); both are configurable
//! through [`TransformConfig`](crate::TransformConfig).

pub mod reader;
pub mod writer;

pub use reader::{parse_xml, parse_xml_with, strip_root};
pub use writer::{serialize_xml, serialize_xml_with};
