use crate::uri::SchemaUri;
use thiserror::Error;

/// The ways a schema document can be malformed. All of these are fatal at
/// seal time; the validator is not constructed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("\"type\" is not one of the simple types or a list of them")]
    InvalidTypeValue,
    #[error("schema is not a boolean or an object")]
    SchemaNotObject,
    #[error("\"$id\" is not a string")]
    IdNotString,
    #[error("URI is malformed or cannot be resolved against the base URI")]
    InvalidUri,
    #[error("\"$ref\" is not a string")]
    RefNotString,
    #[error("keyword value is not an array")]
    InvalidArrayValue,
    #[error("keyword value is not a number")]
    InvalidNumberValue,
    #[error("keyword value is not a non-negative integer")]
    InvalidNaturalValue,
    #[error("keyword value is not a compilable regular expression")]
    InvalidRegexpValue,
    #[error("keyword value is not a boolean")]
    InvalidBoolValue,
    #[error("keyword value is not an array of strings")]
    InvalidPropertyList,
    #[error("keyword value is not an object")]
    InvalidObjectValue,
    #[error("\"dependencies\" is not an object")]
    InvalidDependenciesValue,
    #[error("dependency is not a schema or an array of strings")]
    InvalidDependencyValue,
}

/// Errors raised while sealing a set of schemas into a validator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SealError {
    #[error("invalid schema: {0}")]
    InvalidSchema(#[from] SchemaError),

    /// The `$ref` fixed point closed with references that no registered
    /// document can satisfy. Lists the fragment-less document URI of each
    /// unresolved referring site, in discovery order.
    #[error("unresolved schema references: {}", format_uris(.0))]
    MissingUris(Vec<SchemaUri>),
}

/// Errors raised when evaluating an instance.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidateError {
    #[error("no schema is registered under the given URI")]
    NoSuchSchema,
}

fn format_uris(uris: &[SchemaUri]) -> String {
    uris.iter()
        .map(|uri| uri.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_uris_lists_documents() {
        let err = SealError::MissingUris(vec![
            "urn:example:a".parse().unwrap(),
            "urn:example:b".parse().unwrap(),
        ]);
        assert_eq!(
            "unresolved schema references: urn:example:a, urn:example:b",
            err.to_string()
        );
    }

    #[test]
    fn schema_error_wraps_into_seal_error() {
        let err: SealError = SchemaError::InvalidTypeValue.into();
        assert_eq!(SealError::InvalidSchema(SchemaError::InvalidTypeValue), err);
    }
}
