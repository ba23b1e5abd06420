use crate::errors::SchemaError;
use crate::pointer::Pointer;
use crate::registry::Registry;
use crate::schema::{Dependency, Items, JsonType, Ref, Schema};
use crate::uri::SchemaUri;
use crate::vm::EPSILON;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use url::Url;

/// Parses a document root. Returns the document's base URI (its `$id`, or
/// `None` for an anonymous document) along with the arena index of the root
/// node.
pub(crate) fn parse_root(
    registry: &mut Registry,
    input: &Value,
) -> Result<(Option<Url>, usize), SchemaError> {
    let mut parser = Parser {
        registry: &mut *registry,
        base_uri: None,
        tokens: Vec::new(),
    };

    let index = parser.parse_value(input)?;
    let base_uri = registry.get_index(index).id.clone();
    Ok((base_uri, index))
}

/// Parses a subschema discovered mid-document (reached through a `$ref`
/// fragment rather than the structural walk from the root), registering it
/// at `base_uri` + the pointer rendered from `tokens`.
pub(crate) fn parse_sub(
    registry: &mut Registry,
    base_uri: Option<Url>,
    tokens: Vec<String>,
    input: &Value,
) -> Result<usize, SchemaError> {
    let mut parser = Parser {
        registry,
        base_uri,
        tokens,
    };

    parser.parse_value(input)
}

/// Recursive descent over a raw JSON value tree. Tracks `(base_uri, tokens)`
/// so every node it emits lands in the registry under its canonical URI.
struct Parser<'a> {
    registry: &'a mut Registry,
    base_uri: Option<Url>,
    tokens: Vec<String>,
}

impl Parser<'_> {
    fn uri(&self) -> SchemaUri {
        SchemaUri::new(
            self.base_uri.clone(),
            Pointer::from_tokens(self.tokens.clone()),
        )
    }

    fn parse_value(&mut self, input: &Value) -> Result<usize, SchemaError> {
        match input {
            Value::Bool(accept) => {
                let schema = Schema {
                    boolean: Some(*accept),
                    ..Default::default()
                };

                Ok(self.registry.insert(self.uri(), schema))
            }
            Value::Object(members) => self.parse_object(members),
            _ => Err(SchemaError::SchemaNotObject),
        }
    }

    fn parse_object(&mut self, input: &Map<String, Value>) -> Result<usize, SchemaError> {
        let mut schema = Schema::default();

        // "$id" only resets the base URI at a document root.
        if self.tokens.is_empty() {
            if let Some(id) = input.get("$id") {
                let id = id.as_str().ok_or(SchemaError::IdNotString)?;
                let mut id = Url::parse(id).map_err(|_| SchemaError::InvalidUri)?;
                id.set_fragment(None);

                self.base_uri = Some(id.clone());
                schema.id = Some(id);
            }
        }

        if let Some(reference) = input.get("$ref") {
            let reference = reference.as_str().ok_or(SchemaError::RefNotString)?;
            schema.ref_ = Some(Ref {
                uri: self.resolve(reference)?,
                target: None,
            });
        }

        schema.not = self.subschema(input, "not")?;
        schema.if_ = self.subschema(input, "if")?;
        schema.then = self.subschema(input, "then")?;
        schema.else_ = self.subschema(input, "else")?;
        schema.type_ = type_set(input)?;
        schema.items = self.items(input)?;
        schema.const_ = input.get("const").cloned();
        schema.enum_ = enum_values(input)?;
        schema.multiple_of = number(input, "multipleOf")?;
        schema.maximum = number(input, "maximum")?;
        schema.minimum = number(input, "minimum")?;
        schema.exclusive_maximum = number(input, "exclusiveMaximum")?;
        schema.exclusive_minimum = number(input, "exclusiveMinimum")?;
        schema.max_length = natural(input, "maxLength")?;
        schema.min_length = natural(input, "minLength")?;
        schema.pattern = pattern(input)?;
        schema.additional_items = self.subschema(input, "additionalItems")?;
        schema.max_items = natural(input, "maxItems")?;
        schema.min_items = natural(input, "minItems")?;
        schema.unique_items = boolean(input, "uniqueItems")?;
        schema.contains = self.subschema(input, "contains")?;
        schema.max_properties = natural(input, "maxProperties")?;
        schema.min_properties = natural(input, "minProperties")?;
        schema.required = string_list(input, "required")?;
        schema.properties = self.properties(input)?;
        schema.pattern_properties = self.pattern_properties(input)?;
        schema.additional_properties = self.subschema(input, "additionalProperties")?;
        schema.dependencies = self.dependencies(input)?;
        schema.property_names = self.subschema(input, "propertyNames")?;
        schema.all_of = self.subschema_list(input, "allOf")?;
        schema.any_of = self.subschema_list(input, "anyOf")?;
        schema.one_of = self.subschema_list(input, "oneOf")?;

        Ok(self.registry.insert(self.uri(), schema))
    }

    /// Resolves a `$ref` string against the current base URI per RFC 3986.
    /// The fragment must be a valid JSON Pointer. With no base URI only
    /// fragment-only and absolute references are representable.
    fn resolve(&self, reference: &str) -> Result<SchemaUri, SchemaError> {
        match &self.base_uri {
            Some(base) => {
                let joined = base.join(reference).map_err(|_| SchemaError::InvalidUri)?;
                split_fragment(joined)
            }
            None => {
                if reference.is_empty() {
                    return Ok(SchemaUri::default());
                }

                if let Some(fragment) = reference.strip_prefix('#') {
                    let fragment =
                        Pointer::parse(fragment).map_err(|_| SchemaError::InvalidUri)?;
                    return Ok(SchemaUri::new(None, fragment));
                }

                let url = Url::parse(reference).map_err(|_| SchemaError::InvalidUri)?;
                split_fragment(url)
            }
        }
    }

    fn subschema(
        &mut self,
        input: &Map<String, Value>,
        keyword: &str,
    ) -> Result<Option<usize>, SchemaError> {
        match input.get(keyword) {
            None => Ok(None),
            Some(value) => {
                self.tokens.push(keyword.to_owned());
                let index = self.parse_value(value)?;
                self.tokens.pop();
                Ok(Some(index))
            }
        }
    }

    fn subschema_list(
        &mut self,
        input: &Map<String, Value>,
        keyword: &str,
    ) -> Result<Option<Vec<usize>>, SchemaError> {
        let values = match input.get(keyword) {
            None => return Ok(None),
            Some(Value::Array(values)) => values,
            Some(_) => return Err(SchemaError::InvalidArrayValue),
        };

        self.tokens.push(keyword.to_owned());

        let mut indices = Vec::with_capacity(values.len());
        for (i, value) in values.iter().enumerate() {
            self.tokens.push(i.to_string());
            indices.push(self.parse_value(value)?);
            self.tokens.pop();
        }

        self.tokens.pop();
        Ok(Some(indices))
    }

    fn items(&mut self, input: &Map<String, Value>) -> Result<Option<Items>, SchemaError> {
        let value = match input.get("items") {
            None => return Ok(None),
            Some(value) => value,
        };

        self.tokens.push("items".to_owned());

        let items = match value {
            Value::Array(elements) => {
                let mut indices = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    self.tokens.push(i.to_string());
                    indices.push(self.parse_value(element)?);
                    self.tokens.pop();
                }

                Items::Tuple(indices)
            }
            single => Items::Single(self.parse_value(single)?),
        };

        self.tokens.pop();
        Ok(Some(items))
    }

    fn properties(
        &mut self,
        input: &Map<String, Value>,
    ) -> Result<Option<HashMap<String, usize>>, SchemaError> {
        let members = match input.get("properties") {
            None => return Ok(None),
            Some(Value::Object(members)) => members,
            Some(_) => return Err(SchemaError::InvalidObjectValue),
        };

        self.tokens.push("properties".to_owned());

        let mut schemas = HashMap::with_capacity(members.len());
        for (name, value) in members {
            self.tokens.push(name.clone());
            schemas.insert(name.clone(), self.parse_value(value)?);
            self.tokens.pop();
        }

        self.tokens.pop();
        Ok(Some(schemas))
    }

    fn pattern_properties(
        &mut self,
        input: &Map<String, Value>,
    ) -> Result<Option<Vec<(Regex, usize)>>, SchemaError> {
        let members = match input.get("patternProperties") {
            None => return Ok(None),
            Some(Value::Object(members)) => members,
            Some(_) => return Err(SchemaError::InvalidObjectValue),
        };

        self.tokens.push("patternProperties".to_owned());

        let mut schemas = Vec::with_capacity(members.len());
        for (raw, value) in members {
            let regex = Regex::new(raw).map_err(|_| SchemaError::InvalidRegexpValue)?;

            self.tokens.push(raw.clone());
            let index = self.parse_value(value)?;
            self.tokens.pop();

            schemas.push((regex, index));
        }

        self.tokens.pop();
        Ok(Some(schemas))
    }

    fn dependencies(
        &mut self,
        input: &Map<String, Value>,
    ) -> Result<Option<BTreeMap<String, Dependency>>, SchemaError> {
        let members = match input.get("dependencies") {
            None => return Ok(None),
            Some(Value::Object(members)) => members,
            Some(_) => return Err(SchemaError::InvalidDependenciesValue),
        };

        self.tokens.push("dependencies".to_owned());

        let mut dependencies = BTreeMap::new();
        for (name, value) in members {
            self.tokens.push(name.clone());

            let dependency = match value {
                Value::Array(names) => {
                    let mut properties = Vec::with_capacity(names.len());
                    for name in names {
                        let name = name
                            .as_str()
                            .ok_or(SchemaError::InvalidDependencyValue)?;
                        properties.push(name.to_owned());
                    }

                    Dependency::Properties(properties)
                }
                Value::Object(_) | Value::Bool(_) => {
                    Dependency::Schema(self.parse_value(value)?)
                }
                _ => return Err(SchemaError::InvalidDependencyValue),
            };

            dependencies.insert(name.clone(), dependency);
            self.tokens.pop();
        }

        self.tokens.pop();
        Ok(Some(dependencies))
    }
}

fn split_fragment(mut url: Url) -> Result<SchemaUri, SchemaError> {
    let fragment = match url.fragment() {
        Some(fragment) => Pointer::parse(fragment).map_err(|_| SchemaError::InvalidUri)?,
        None => Pointer::root(),
    };

    url.set_fragment(None);
    Ok(SchemaUri::new(Some(url), fragment))
}

fn type_set(input: &Map<String, Value>) -> Result<Option<Vec<JsonType>>, SchemaError> {
    let value = match input.get("type") {
        None => return Ok(None),
        Some(value) => value,
    };

    let types = match value {
        Value::String(single) => vec![parse_type(single)?],
        Value::Array(list) => {
            let mut types = Vec::with_capacity(list.len());
            for element in list {
                let element = element.as_str().ok_or(SchemaError::InvalidTypeValue)?;
                types.push(parse_type(element)?);
            }

            types
        }
        _ => return Err(SchemaError::InvalidTypeValue),
    };

    Ok(Some(types))
}

fn parse_type(raw: &str) -> Result<JsonType, SchemaError> {
    raw.parse().map_err(|()| SchemaError::InvalidTypeValue)
}

fn enum_values(input: &Map<String, Value>) -> Result<Option<Vec<Value>>, SchemaError> {
    match input.get("enum") {
        None => Ok(None),
        Some(Value::Array(values)) => Ok(Some(values.clone())),
        Some(_) => Err(SchemaError::InvalidArrayValue),
    }
}

fn number(input: &Map<String, Value>, keyword: &str) -> Result<Option<f64>, SchemaError> {
    match input.get(keyword) {
        None => Ok(None),
        Some(Value::Number(value)) => Ok(value.as_f64()),
        Some(_) => Err(SchemaError::InvalidNumberValue),
    }
}

fn natural(input: &Map<String, Value>, keyword: &str) -> Result<Option<usize>, SchemaError> {
    let value = match input.get(keyword) {
        None => return Ok(None),
        Some(Value::Number(raw)) => match raw.as_f64() {
            Some(value) => value,
            None => return Err(SchemaError::InvalidNaturalValue),
        },
        Some(_) => return Err(SchemaError::InvalidNaturalValue),
    };

    if value.fract().abs() > EPSILON || value < 0.0 {
        return Err(SchemaError::InvalidNaturalValue);
    }

    Ok(Some(value.round() as usize))
}

fn pattern(input: &Map<String, Value>) -> Result<Option<Regex>, SchemaError> {
    match input.get("pattern") {
        None => Ok(None),
        Some(Value::String(raw)) => Regex::new(raw)
            .map(Some)
            .map_err(|_| SchemaError::InvalidRegexpValue),
        Some(_) => Err(SchemaError::InvalidRegexpValue),
    }
}

fn boolean(input: &Map<String, Value>, keyword: &str) -> Result<Option<bool>, SchemaError> {
    match input.get(keyword) {
        None => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(_) => Err(SchemaError::InvalidBoolValue),
    }
}

fn string_list(
    input: &Map<String, Value>,
    keyword: &str,
) -> Result<Option<Vec<String>>, SchemaError> {
    let values = match input.get(keyword) {
        None => return Ok(None),
        Some(Value::Array(values)) => values,
        Some(_) => return Err(SchemaError::InvalidPropertyList),
    };

    let mut names = Vec::with_capacity(values.len());
    for value in values {
        let name = value.as_str().ok_or(SchemaError::InvalidPropertyList)?;
        names.push(name.to_owned());
    }

    Ok(Some(names))
}
