//! Request-level orchestration
//!
//! Checks that a request carries everything it needs, then runs
//! parse, flatten, rebuild and serialize in order. Any failure abandons the
//! whole request; there is no partial output.

use crate::error::{Result, TranslateError};
use crate::flatten::flatten;
use crate::mapping::parse_mapping;
use crate::propose::MappingProposer;
use crate::rebuild::rebuild;
use crate::schema::root_name_from_xsd;
use crate::types::{FlatTable, MappingTable, TransformConfig};
use crate::xml::{parse_xml_with, serialize_xml_with, strip_root};
use serde_json::Value;
use tracing::{debug, warn};

/// The document being transformed
#[derive(Debug, Clone)]
pub enum SourceDocument {
    /// XML text; its outermost element is stripped before flattening
    Xml(String),
    /// An already-structured JSON object, flattened as is
    Json(Value),
}

impl SourceDocument {
    fn is_blank(&self) -> bool {
        match self {
            SourceDocument::Xml(text) => text.trim().is_empty(),
            SourceDocument::Json(value) => value.is_null(),
        }
    }

    /// Flatten the document's fields
    pub fn to_flat(&self, config: &TransformConfig) -> Result<FlatTable> {
        let tree = match self {
            SourceDocument::Xml(text) => strip_root(parse_xml_with(text, config)?)?,
            SourceDocument::Json(value) => value.clone(),
        };
        Ok(flatten(&tree))
    }
}

/// Inputs for one transform
#[derive(Debug, Clone, Default)]
pub struct TransformRequest {
    pub source: Option<SourceDocument>,
    /// Mapping table text (JSON object)
    pub mapping: Option<String>,
    /// Target XSD text, used for the root element name
    pub target_schema: Option<String>,
}

/// A request that passed validation
struct ValidRequest<'a> {
    source: &'a SourceDocument,
    mapping: &'a str,
    target_schema: &'a str,
}

impl TransformRequest {
    pub fn new(source: SourceDocument, mapping: impl Into<String>, target_schema: impl Into<String>) -> Self {
        TransformRequest {
            source: Some(source),
            mapping: Some(mapping.into()),
            target_schema: Some(target_schema.into()),
        }
    }

    /// Check that every field is present and non-blank
    pub fn validate(&self) -> Result<()> {
        self.checked().map(|_| ())
    }

    fn checked(&self) -> Result<ValidRequest<'_>> {
        let source = self
            .source
            .as_ref()
            .filter(|s| !s.is_blank())
            .ok_or(TranslateError::MissingField("source document"))?;
        let mapping = required(self.mapping.as_deref(), "mapping")?;
        let target_schema = required(self.target_schema.as_deref(), "target schema")?;

        Ok(ValidRequest {
            source,
            mapping,
            target_schema,
        })
    }
}

fn required<'a>(field: Option<&'a str>, name: &'static str) -> Result<&'a str> {
    field
        .filter(|v| !v.trim().is_empty())
        .ok_or(TranslateError::MissingField(name))
}

/// Run a request and return the rebuilt tree
pub fn transform_to_tree(request: &TransformRequest, config: &TransformConfig) -> Result<Value> {
    let request = request.checked()?;

    let mapping = parse_mapping(request.mapping)?;
    let root_name = root_name_from_xsd(request.target_schema).unwrap_or_else(|| {
        warn!(fallback = %config.fallback_root, "no element declaration found in target schema");
        config.fallback_root.clone()
    });

    let flat = request.source.to_flat(config)?;
    debug!(fields = flat.len(), mappings = mapping.len(), root = %root_name, "transforming document");

    Ok(rebuild(&mapping, &flat, Some(root_name.as_str())))
}

/// Run a request and return the serialized XML
pub fn transform(request: &TransformRequest, config: &TransformConfig) -> Result<String> {
    let tree = transform_to_tree(request, config)?;
    serialize_xml_with(&tree, config)
}

/// Ask `proposer` for a mapping and parse what it returns
pub fn propose_mapping<P: MappingProposer + ?Sized>(
    proposer: &P,
    source_schema: &str,
    target_schema: &str,
) -> Result<MappingTable> {
    let source_schema = required(Some(source_schema), "source schema")?;
    let target_schema = required(Some(target_schema), "target schema")?;

    let text = proposer.propose(source_schema, target_schema)?;
    parse_mapping(&text)
}
