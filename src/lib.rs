//! An implementation of JSON Schema validation (a
//! [draft-07](https://json-schema.org/specification-links.html#draft-7)
//! subset).
//!
//! `jsv` compiles a set of JSON Schema documents into a sealed, immutable
//! [`Validator`], then evaluates JSON instances against it, producing an
//! ordered list of validation errors annotated with JSON Pointers into both
//! the instance and the schema that rejected it.
//!
//! # Quick start
//!
//! ```
//! use jsv::Validator;
//! use serde_json::json;
//!
//! let validator = Validator::new(&[json!({
//!     "properties": {
//!         "name": { "type": "string" },
//!         "age": { "type": "integer" }
//!     },
//!     "required": ["name"]
//! })])
//! .expect("seal schemas");
//!
//! // This input is ok.
//! assert!(validator.is_valid(&json!({ "name": "John Doe", "age": 43 })));
//!
//! // This input is bad ("name" is missing, "age" is a string), so validation
//! // comes back with errors.
//! assert!(!validator.is_valid(&json!({ "age": "43" })));
//! ```
//!
//! # Common usage
//!
//! In the real world you usually want to know what the validation errors
//! were, rather than just flatly rejecting input as "invalid" without any
//! further details. Each error carries two JSON Pointers: the path to the
//! part of the instance that was rejected, and the path to the part of the
//! schema that rejected it.
//!
//! ```
//! use jsv::Validator;
//! use serde_json::json;
//!
//! let validator = Validator::new(&[json!({
//!     "properties": {
//!         "name": { "type": "string" },
//!         "age": { "type": "integer" }
//!     },
//!     "required": ["name"]
//! })])
//! .expect("seal schemas");
//!
//! let result = validator
//!     .validate_default(&json!({ "age": "43" }))
//!     .expect("validate");
//!
//! let paths: Vec<(String, String)> = result
//!     .errors
//!     .iter()
//!     .map(|error| (error.instance_path.to_string(), error.schema_path.to_string()))
//!     .collect();
//!
//! assert_eq!(
//!     vec![
//!         // "name" is required but not present,
//!         ("".to_owned(), "/required/0".to_owned()),
//!         // "age" has the wrong type.
//!         ("/age".to_owned(), "/properties/age/type".to_owned()),
//!     ],
//!     paths
//! );
//! ```
//!
//! # Cross-references
//!
//! A validator seals a *set* of documents. A document's `$id` names it for
//! `$ref` cross-references, which resolve per RFC 3986 against the nearest
//! enclosing base URI; the first document without an `$id` lives under the
//! empty URI and becomes the default schema. Every reference is resolved up
//! front: sealing fails with [`SealError::MissingUris`] rather than ever
//! fetching anything at validation time.
//!
//! ```
//! use jsv::Validator;
//! use serde_json::json;
//!
//! let validator = Validator::new(&[
//!     json!({ "items": { "$ref": "urn:example:odd" } }),
//!     json!({ "$id": "urn:example:odd", "type": "integer", "multipleOf": 2 }),
//! ])
//! .expect("seal schemas");
//!
//! let result = validator.validate_default(&json!([2, 3])).expect("validate");
//!
//! assert_eq!(1, result.errors.len());
//! assert_eq!("/1", result.errors[0].instance_path.to_string());
//! assert_eq!("/multipleOf", result.errors[0].schema_path.to_string());
//! assert_eq!(
//!     "urn:example:odd",
//!     result.errors[0].uri.as_ref().unwrap().as_str()
//! );
//! ```
//!
//! # Security considerations
//!
//! Schema graphs may be cyclic (`{"$ref": "#"}` is a perfectly well-formed
//! document), so a naive evaluator can recurse forever. Reference-following
//! is bounded by [`Config::with_max_stack_depth`] (default 128); when the
//! bound is hit the result comes back with `overflowed` set and no errors.
//! [`Config::with_max_errors`] additionally caps how many errors a single
//! validation may accumulate, which also bounds its memory.
//!
//! ```
//! use jsv::{Config, Validator};
//! use serde_json::json;
//!
//! let validator = Validator::with_config(
//!     Config::new().with_max_stack_depth(32),
//!     &[json!({ "$ref": "#" })],
//! )
//! .expect("seal schemas");
//!
//! let result = validator.validate_default(&json!(null)).expect("validate");
//! assert!(result.overflowed);
//! assert!(!result.is_valid());
//! ```

mod arena;
mod equal;
mod errors;
mod parser;
mod pointer;
mod registry;
mod schema;
mod uri;
mod validator;
mod vm;

pub use errors::*;
pub use pointer::*;
pub use uri::*;
pub use validator::*;
