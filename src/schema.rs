use crate::uri::SchemaUri;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use url::Url;

/// A compiled schema node. Every keyword slot is optional; absent means the
/// keyword was not declared. Subschema-valued slots hold arena indices, never
/// owning references, so cyclic `$ref` graphs need no special casing.
#[derive(Clone, Debug, Default)]
pub(crate) struct Schema {
    pub id: Option<Url>,
    pub boolean: Option<bool>,
    pub ref_: Option<Ref>,
    pub type_: Option<Vec<JsonType>>,
    pub const_: Option<Value>,
    pub enum_: Option<Vec<Value>>,
    pub multiple_of: Option<f64>,
    pub maximum: Option<f64>,
    pub minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub items: Option<Items>,
    pub additional_items: Option<usize>,
    pub max_items: Option<usize>,
    pub min_items: Option<usize>,
    pub unique_items: Option<bool>,
    pub contains: Option<usize>,
    pub max_properties: Option<usize>,
    pub min_properties: Option<usize>,
    pub required: Option<Vec<String>>,
    pub properties: Option<HashMap<String, usize>>,
    pub pattern_properties: Option<Vec<(Regex, usize)>>,
    pub additional_properties: Option<usize>,
    pub dependencies: Option<BTreeMap<String, Dependency>>,
    pub property_names: Option<usize>,
    pub not: Option<usize>,
    pub if_: Option<usize>,
    pub then: Option<usize>,
    pub else_: Option<usize>,
    pub all_of: Option<Vec<usize>>,
    pub any_of: Option<Vec<usize>>,
    pub one_of: Option<Vec<usize>>,
}

impl Schema {
    /// Whether a declared `type` keyword admits `type_value`. Returns true
    /// when `type` is absent.
    pub fn allows_type(&self, type_value: JsonType) -> bool {
        match &self.type_ {
            Some(types) => types.contains(&type_value),
            None => true,
        }
    }
}

/// A `$ref` edge: the target's canonical URI, and the arena index the seal
/// phase back-patches once the target is known.
#[derive(Clone, Debug)]
pub(crate) struct Ref {
    pub uri: SchemaUri,
    pub target: Option<usize>,
}

#[derive(Clone, Debug)]
pub(crate) enum Items {
    Single(usize),
    Tuple(Vec<usize>),
}

#[derive(Clone, Debug)]
pub(crate) enum Dependency {
    Schema(usize),
    Properties(Vec<String>),
}

/// The seven simple types of the `type` keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum JsonType {
    Null,
    Boolean,
    Number,
    Integer,
    String,
    Array,
    Object,
}

impl FromStr for JsonType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "null" => Ok(Self::Null),
            "boolean" => Ok(Self::Boolean),
            "number" => Ok(Self::Number),
            "integer" => Ok(Self::Integer),
            "string" => Ok(Self::String),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_type_from_str() {
        assert_eq!(Err(()), "Null".parse::<JsonType>());
        assert_eq!(Err(()), "int".parse::<JsonType>());
        assert_eq!(Ok(JsonType::Null), "null".parse());
        assert_eq!(Ok(JsonType::Boolean), "boolean".parse());
        assert_eq!(Ok(JsonType::Number), "number".parse());
        assert_eq!(Ok(JsonType::Integer), "integer".parse());
        assert_eq!(Ok(JsonType::String), "string".parse());
        assert_eq!(Ok(JsonType::Array), "array".parse());
        assert_eq!(Ok(JsonType::Object), "object".parse());
    }

    #[test]
    fn absent_type_allows_everything() {
        let schema = Schema::default();
        assert!(schema.allows_type(JsonType::Null));
        assert!(schema.allows_type(JsonType::Object));
    }

    #[test]
    fn declared_type_restricts() {
        let schema = Schema {
            type_: Some(vec![JsonType::Integer, JsonType::String]),
            ..Default::default()
        };
        assert!(schema.allows_type(JsonType::Integer));
        assert!(schema.allows_type(JsonType::String));
        assert!(!schema.allows_type(JsonType::Number));
    }
}
