use crate::errors::{SealError, ValidateError};
use crate::parser;
use crate::pointer::Pointer;
use crate::registry::Registry;
use crate::uri::SchemaUri;
use crate::vm::{Vm, VmError};
use serde_json::Value;
use std::collections::HashMap;
use url::Url;

/// Evaluation bounds. `max_stack_depth` caps how many `$ref` frames may be
/// live at once, which is what terminates evaluation of cyclic schema graphs;
/// `max_errors` caps the length of the reported error list, where `0` means
/// unlimited (not "no errors allowed").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    max_stack_depth: usize,
    max_errors: usize,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_stack_depth(mut self, max_stack_depth: usize) -> Self {
        self.max_stack_depth = max_stack_depth;
        self
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_stack_depth: 128,
            max_errors: 0,
        }
    }
}

/// A sealed set of schemas. Compiling resolves every `$ref` up front, so
/// validating never fetches anything and shares nothing mutable; one
/// `Validator` can serve any number of [`validate`](Validator::validate)
/// calls, concurrently if shared by reference.
#[derive(Debug)]
pub struct Validator {
    config: Config,
    registry: Registry,
    default_uri: SchemaUri,
}

impl Validator {
    /// Seals `schemas` with the default [`Config`].
    ///
    /// Each element must be a boolean or an object. A document's `$id` (an
    /// absolute URI) names it for cross-references; the first document
    /// without an `$id` is registered under the empty URI and becomes the
    /// default schema.
    pub fn new(schemas: &[Value]) -> Result<Self, SealError> {
        Self::with_config(Config::default(), schemas)
    }

    pub fn with_config(config: Config, schemas: &[Value]) -> Result<Self, SealError> {
        let mut registry = Registry::new();
        let mut raw_documents: HashMap<Option<Url>, &Value> = HashMap::new();
        let mut bases = Vec::with_capacity(schemas.len());

        for schema in schemas {
            let (base, _) = parser::parse_root(&mut registry, schema)?;
            raw_documents.entry(base.clone()).or_insert(schema);
            bases.push(base);
        }

        let default_uri = if bases.iter().any(|base| base.is_none()) {
            SchemaUri::default()
        } else {
            SchemaUri::document_root(bases.first().cloned().flatten())
        };

        // Resolve refs to a fixed point. A ref may target a subschema that
        // the structural walk never reached (one addressed only through a
        // mid-document fragment); each pass parses those out of the raw
        // documents, which may in turn introduce new refs.
        loop {
            let missing = registry.populate_refs();
            if missing.is_empty() {
                break;
            }

            let mut progress = false;
            let mut unresolved = Vec::new();

            for uri in missing {
                let raw = match raw_documents.get(&uri.base().cloned()) {
                    Some(&raw) => raw,
                    None => {
                        unresolved.push(uri.document());
                        continue;
                    }
                };

                match uri.fragment().eval(raw) {
                    Some(subschema) => {
                        parser::parse_sub(
                            &mut registry,
                            uri.base().cloned(),
                            uri.fragment().tokens().to_vec(),
                            subschema,
                        )?;
                        progress = true;
                    }
                    None => unresolved.push(uri.document()),
                }
            }

            if !progress {
                return Err(SealError::MissingUris(unresolved));
            }
        }

        Ok(Validator {
            config,
            registry,
            default_uri,
        })
    }

    /// Validates `instance` against the schema registered under `uri`.
    ///
    /// Fails only if no schema is registered under `uri`. Validation
    /// mismatches are not failures; they are entries in the returned result's
    /// error list, emitted in a deterministic depth-first order.
    pub fn validate(
        &self,
        uri: &SchemaUri,
        instance: &Value,
    ) -> Result<ValidationResult, ValidateError> {
        let schema = self.registry.get(uri).ok_or(ValidateError::NoSuchSchema)?;

        let mut vm = Vm::new(
            &self.registry,
            self.config.max_stack_depth,
            self.config.max_errors,
        );

        match vm.exec(uri, schema, instance) {
            Ok(()) | Err(VmError::MaxErrorsReached) => Ok(ValidationResult {
                errors: vm.into_errors(),
                overflowed: false,
            }),
            Err(VmError::StackOverflow) => Ok(ValidationResult {
                errors: Vec::new(),
                overflowed: true,
            }),
        }
    }

    /// Validates `instance` against the default schema.
    pub fn validate_default(&self, instance: &Value) -> Result<ValidationResult, ValidateError> {
        self.validate(&self.default_uri, instance)
    }

    /// Whether `instance` cleanly satisfies the default schema.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validate_default(instance)
            .map(|result| result.is_valid())
            .unwrap_or(false)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// Validation errors in the evaluator's traversal order.
    pub errors: Vec<ValidationError>,

    /// Set when evaluation aborted because reference-following exceeded the
    /// configured `max_stack_depth`; the partial error list is discarded.
    pub overflowed: bool,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && !self.overflowed
    }
}

/// A single validation mismatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    /// Where in the instance the rejected value lives.
    pub instance_path: Pointer,

    /// Where in the rejecting schema the failed keyword lives, relative to
    /// that schema's document root.
    pub schema_path: Pointer,

    /// The `$id` of the schema document that rejected the value; `None` for
    /// the anonymous default document.
    pub uri: Option<Url>,
}
