//! Root element detection for target XSD text

use once_cell::sync::Lazy;
use regex::Regex;

/// Root used when the target schema does not declare an element we can find
pub const DEFAULT_ROOT_NAME: &str = "TransformedOutput";

static ELEMENT_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(?:xs|xsd):element\s+name\s*=\s*"([^"]+)""#).unwrap()
});

/// Name of the first element declared in `xsd`.
///
/// This is a textual match, not a schema parse: the first declaration in
/// document order is assumed to be the document root.
pub fn root_name_from_xsd(xsd: &str) -> Option<String> {
    ELEMENT_NAME_REGEX
        .captures(xsd)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
