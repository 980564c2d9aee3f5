//! # xsd-translate - Mapping-driven XML restructuring
//!
//! Converts documents between a flat, dot-addressed view and a nested XML
//! tree, guided by a mapping table from source paths to target paths.
//!
//! ## Modules
//!
//! - **flatten**: Walk a nested tree into `path -> scalar` pairs
//! - **rebuild**: Build a nested tree from a mapping table and a flat table
//! - **mapping**: Parse untrusted mapping text
//! - **xml**: Read and write XML documents as trees
//! - **propose**: Ask a model for a mapping between two schemas
//! - **pipeline**: Validate requests and run the whole transform
//!
//! ## Quick Start
//!
//! ```rust
//! use xsd_translate::{flatten, rebuild, parse_mapping};
//! use serde_json::json;
//!
//! # fn main() -> xsd_translate::Result<()> {
//! let source = json!({
//!     "customerId": "C-1",
//!     "address": {"line1": "1 Main St"}
//! });
//! let mapping = parse_mapping(r#"{
//!     "customerId": "CustomerRequest.CustID",
//!     "address.line1": "CustomerRequest.BasicInfo.Line1"
//! }"#)?;
//!
//! let tree = rebuild(&mapping, &flatten(&source), Some("CustomerRequest"));
//! assert_eq!(tree, json!({
//!     "CustomerRequest": {"CustID": "C-1", "BasicInfo": {"Line1": "1 Main St"}}
//! }));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod flatten;
pub mod mapping;
pub mod pipeline;
pub mod propose;
pub mod rebuild;
pub mod schema;
pub mod types;
pub mod xml;

// Re-export commonly used types for convenience
pub use error::{Result, TranslateError};
pub use flatten::flatten;
pub use mapping::parse_mapping;
pub use pipeline::{propose_mapping, transform, transform_to_tree, SourceDocument, TransformRequest};
pub use propose::{MappingProposer, OpenAiProposer, ProposerConfig};
pub use rebuild::rebuild;
pub use schema::root_name_from_xsd;
pub use types::{FlatTable, MappingTable, MappingTarget, TransformConfig};
pub use xml::{parse_xml, serialize_xml};

/// Main entry point: transform an XML document with a mapping and target schema
pub fn transform_xml(input_xml: &str, mapping: &str, target_schema: &str) -> Result<String> {
    let request = TransformRequest::new(SourceDocument::Xml(input_xml.to_string()), mapping, target_schema);
    transform(&request, &TransformConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_transform() {
        let xsd = r#"<xs:schema><xs:element name="Quote"/></xs:schema>"#;
        let input = "<Order><Amount>12.50</Amount><Buyer><Name>Ann</Name></Buyer></Order>";
        let mapping = r#"{"Amount": "Foo.Total", "Buyer.Name": "Bar.Customer.Name"}"#;

        let xml = transform_xml(input, mapping, xsd).unwrap();

        assert_eq!(
            parse_xml(&xml).unwrap(),
            serde_json::json!({"Quote": {"Total": "12.50", "Customer": {"Name": "Ann"}}})
        );
    }
}
