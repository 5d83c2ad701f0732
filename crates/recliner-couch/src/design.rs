//! The `_design/recliner` document.
//!
//! Holds the URL rewrite table that serves the data-grid application from the
//! design document's attachments, the `docs` view and the update validator.
//! The view and validator are evaluated natively here; their JavaScript
//! sources are carried only because the document store executes them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CouchError, Result};

/// Document id of the design document
pub const DESIGN_DOC_ID: &str = "_design/recliner";

/// Name of the view emitting `field0 -> field1`
pub const DOCS_VIEW: &str = "docs";

const DOCS_MAP_SOURCE: &str = "function(doc) {\n  if(doc.field0 && doc.field1) {\n    emit(doc.field0, doc.field1)\n  }\n}";

const VALIDATE_SOURCE: &str = "function (newDoc, oldDoc, userCtx) {\n  if (newDoc._deleted === true && userCtx.roles.indexOf('_admin') === -1) {\n    throw({forbidden: \"Only admin can delete documents on this database.\"});\n  }\n}";

/// A single rewrite rule; `*` in `from` captures the rest of the path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewrite {
    pub from: String,
    pub to: String,
}

impl Rewrite {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Check the rule is well formed (`*` only as the last character of `from`)
    pub fn validate(&self) -> Result<()> {
        if !self.from.starts_with('/') {
            return Err(CouchError::InvalidRewrite {
                from: self.from.clone(),
                reason: "must start with '/'".to_string(),
            });
        }
        if let Some(pos) = self.from.find('*') {
            if pos != self.from.len() - 1 {
                return Err(CouchError::InvalidRewrite {
                    from: self.from.clone(),
                    reason: "'*' is only allowed at the end".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Rewrite `path` if this rule matches it
    pub fn apply(&self, path: &str) -> Option<String> {
        match self.from.strip_suffix('*') {
            Some(prefix) => {
                let rest = path.strip_prefix(prefix)?;
                Some(self.to.replacen('*', rest, 1))
            }
            None if path == self.from => Some(self.to.clone()),
            None => None,
        }
    }
}

/// A map view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub map: String,
}

/// The design document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub rewrites: Vec<Rewrite>,
    #[serde(default)]
    pub views: BTreeMap<String, View>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_doc_update: Option<String>,
}

impl Default for DesignDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DesignDocument {
    /// The standard recliner design document
    pub fn new() -> Self {
        let mut views = BTreeMap::new();
        views.insert(
            DOCS_VIEW.to_string(),
            View {
                map: DOCS_MAP_SOURCE.to_string(),
            },
        );

        Self {
            id: DESIGN_DOC_ID.to_string(),
            rewrites: default_rewrites(),
            views,
            validate_doc_update: Some(VALIDATE_SOURCE.to_string()),
        }
    }

    /// Apply the first matching rewrite rule
    ///
    /// An empty path is treated as `/`.
    pub fn rewrite(&self, path: &str) -> Option<String> {
        let path = if path.is_empty() { "/" } else { path };
        self.rewrites.iter().find_map(|rule| rule.apply(path))
    }

    /// Validate every rewrite rule
    pub fn validate(&self) -> Result<()> {
        self.rewrites.iter().try_for_each(Rewrite::validate)
    }

    /// Serialize the design document to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a design document from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// `/` -> app, `/api` -> database root, everything else -> attachments
pub fn default_rewrites() -> Vec<Rewrite> {
    vec![
        Rewrite::new("/", "index.html"),
        Rewrite::new("/api", "../../"),
        Rewrite::new("/api/*", "../../*"),
        Rewrite::new("/*", "*"),
    ]
}

/// Evaluate the `docs` view for one document
///
/// Emits `(field0, field1)` when both are present and truthy.
pub fn map_docs(doc: &Value) -> Option<(Value, Value)> {
    let key = doc.get("field0").filter(|v| is_truthy(v))?;
    let value = doc.get("field1").filter(|v| is_truthy(v))?;
    Some((key.clone(), value.clone()))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_rewrites() {
        let ddoc = DesignDocument::new();

        assert_eq!(ddoc.rewrite("/"), Some("index.html".to_string()));
        assert_eq!(ddoc.rewrite(""), Some("index.html".to_string()));
        assert_eq!(ddoc.rewrite("/api"), Some("../../".to_string()));
        assert_eq!(ddoc.rewrite("/api/_all_docs"), Some("../../_all_docs".to_string()));
        assert_eq!(ddoc.rewrite("/api/"), Some("../../".to_string()));
        assert_eq!(ddoc.rewrite("/src/backend.js"), Some("src/backend.js".to_string()));
    }

    #[test]
    fn test_rewrite_no_match() {
        let rule = Rewrite::new("/api/*", "../../*");
        assert_eq!(rule.apply("/other"), None);
        assert_eq!(Rewrite::new("/", "index.html").apply("/x"), None);
    }

    #[test]
    fn test_validate_rules() {
        assert!(DesignDocument::new().validate().is_ok());
        assert!(Rewrite::new("api", "x").validate().is_err());
        assert!(Rewrite::new("/a*/b", "x").validate().is_err());
    }

    #[test]
    fn test_json_shape() {
        let json: Value = serde_json::from_str(&DesignDocument::new().to_json().unwrap()).unwrap();

        assert_eq!(json["_id"], "_design/recliner");
        assert_eq!(json["rewrites"][0], json!({ "from": "/", "to": "index.html" }));
        assert_eq!(json["rewrites"].as_array().map(Vec::len), Some(4));
        assert!(json["views"]["docs"]["map"].is_string());
        assert!(json["validate_doc_update"].is_string());
    }

    #[test]
    fn test_json_roundtrip() {
        let ddoc = DesignDocument::new();
        let parsed = DesignDocument::from_json(&ddoc.to_json().unwrap()).unwrap();
        assert_eq!(parsed, ddoc);
    }

    #[test]
    fn test_docs_view() {
        assert_eq!(
            map_docs(&json!({ "field0": "k", "field1": 3 })),
            Some((json!("k"), json!(3)))
        );
        assert_eq!(map_docs(&json!({ "field0": "k" })), None);
        assert_eq!(map_docs(&json!({ "field0": "", "field1": "v" })), None);
        assert_eq!(map_docs(&json!({ "field0": "k", "field1": 0 })), None);
        assert_eq!(map_docs(&json!({ "field0": "k", "field1": false })), None);
        assert_eq!(map_docs(&json!({ "field0": "k", "field1": null })), None);
        assert_eq!(
            map_docs(&json!({ "field0": [1], "field1": {} })),
            Some((json!([1]), json!({})))
        );
    }
}
