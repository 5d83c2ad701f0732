//! Update authorization for documents in the recliner database.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Role allowed to delete documents
pub const ADMIN_ROLE: &str = "_admin";

/// Message returned when a non-admin tries to delete
pub const DELETE_FORBIDDEN: &str = "Only admin can delete documents on this database.";

/// The user context the document store passes to update validators
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCtx {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserCtx {
    pub fn new(name: impl Into<String>, roles: &[&str]) -> Self {
        Self {
            name: Some(name.into()),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Outcome of an update check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    Forbidden { reason: String },
}

impl Authorization {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Authorization::Allowed)
    }

    /// Body the document store expects for a rejected update
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Authorization::Allowed => None,
            Authorization::Forbidden { reason } => Some(json!({ "forbidden": reason })),
        }
    }
}

/// Check whether `user` may write `new_doc`
///
/// Deletions (`_deleted: true`) need the `_admin` role; every other write is
/// allowed. The previous revision does not influence the outcome.
pub fn authorize_update(new_doc: &Value, _old_doc: Option<&Value>, user: &UserCtx) -> Authorization {
    let deleting = new_doc.get("_deleted").and_then(Value::as_bool) == Some(true);

    if deleting && !user.is_admin() {
        return Authorization::Forbidden {
            reason: DELETE_FORBIDDEN.to_string(),
        };
    }

    Authorization::Allowed
}
