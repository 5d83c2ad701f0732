//! # recliner-couch
//!
//! Design document used to serve recliner from a document store: rewrite
//! rules mapping the application and database API under one prefix, the
//! `docs` view and a typed delete guard.
//!
//! ## Example
//!
//! ```
//! use recliner_couch::{authorize_update, DesignDocument, UserCtx};
//! use serde_json::json;
//!
//! let ddoc = DesignDocument::new();
//! assert_eq!(ddoc.rewrite("/api/_all_docs").as_deref(), Some("../../_all_docs"));
//!
//! let user = UserCtx::new("bob", &["editor"]);
//! let check = authorize_update(&json!({ "_deleted": true }), None, &user);
//! assert!(!check.is_allowed());
//! ```

pub mod auth;
pub mod design;
pub mod error;

pub use auth::{authorize_update, Authorization, UserCtx, ADMIN_ROLE};
pub use design::{map_docs, DesignDocument, Rewrite, View, DESIGN_DOC_ID};
pub use error::{CouchError, Result};
