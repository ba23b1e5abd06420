use crate::equal::deep_equal;
use crate::pointer::Pointer;
use crate::registry::Registry;
use crate::schema::{Dependency, Items, JsonType, Schema};
use crate::uri::SchemaUri;
use crate::validator::ValidationError;
use serde_json::Value;
use std::mem;
use url::Url;

/// Tolerance applied to `multipleOf` and the exclusive bounds, papering over
/// 64-bit float representation noise.
pub(crate) const EPSILON: f64 = 1e-3;

/// Internal unwind signals. Neither is a validation error: `MaxErrorsReached`
/// means the accumulated list is the result, `StackOverflow` means reference
/// following exhausted the configured depth.
pub(crate) enum VmError {
    MaxErrorsReached,
    StackOverflow,
}

/// One entry of the schema stack: which schema document we are in, and the
/// token path within it that the next error report will use.
struct Frame {
    id: Option<Url>,
    tokens: Vec<String>,
}

pub(crate) struct Vm<'a> {
    registry: &'a Registry,
    max_stack_depth: usize,
    max_errors: usize,
    instance_tokens: Vec<String>,
    frames: Vec<Frame>,
    errors: Vec<ValidationError>,
    pseudo_depth: usize,
}

impl<'a> Vm<'a> {
    pub fn new(registry: &'a Registry, max_stack_depth: usize, max_errors: usize) -> Self {
        Vm {
            registry,
            max_stack_depth,
            max_errors,
            instance_tokens: Vec::new(),
            frames: Vec::new(),
            errors: Vec::new(),
            pseudo_depth: 0,
        }
    }

    pub fn exec(
        &mut self,
        uri: &SchemaUri,
        schema: &Schema,
        instance: &Value,
    ) -> Result<(), VmError> {
        self.frames.push(Frame {
            id: uri.base().cloned(),
            tokens: uri.fragment().tokens().to_vec(),
        });

        self.exec_schema(schema, instance)
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    fn exec_schema(&mut self, schema: &Schema, instance: &Value) -> Result<(), VmError> {
        if let Some(accept) = schema.boolean {
            if !accept {
                self.report_error()?;
            }

            return Ok(());
        }

        if let Some(ref_) = &schema.ref_ {
            if self.frames.len() >= self.max_stack_depth {
                return Err(VmError::StackOverflow);
            }

            // Seal guarantees every surviving ref carries a target index.
            let target = self.registry.get_index(ref_.target.unwrap());

            self.frames.push(Frame {
                id: ref_.uri.base().cloned(),
                tokens: ref_.uri.fragment().tokens().to_vec(),
            });
            self.exec_schema(target, instance)?;
            self.frames.pop();
        }

        if let Some(index) = schema.not {
            let not_schema = self.registry.get_index(index);
            if !self.pseudo_exec(not_schema, instance)? {
                self.keyword_error("not")?;
            }
        }

        if let Some(index) = schema.if_ {
            let if_schema = self.registry.get_index(index);
            if !self.pseudo_exec(if_schema, instance)? {
                if let Some(then) = schema.then {
                    self.push_schema_token("then");
                    self.exec_schema(self.registry.get_index(then), instance)?;
                    self.pop_schema_token();
                }
            } else if let Some(else_) = schema.else_ {
                self.push_schema_token("else");
                self.exec_schema(self.registry.get_index(else_), instance)?;
                self.pop_schema_token();
            }
        }

        if let Some(const_) = &schema.const_ {
            if !deep_equal(instance, const_) {
                self.keyword_error("const")?;
            }
        }

        if let Some(enum_) = &schema.enum_ {
            if !enum_.iter().any(|value| deep_equal(instance, value)) {
                self.keyword_error("enum")?;
            }
        }

        if let Some(all_of) = &schema.all_of {
            self.push_schema_token("allOf");

            for (i, &index) in all_of.iter().enumerate() {
                self.push_schema_token(&i.to_string());
                self.exec_schema(self.registry.get_index(index), instance)?;
                self.pop_schema_token();
            }

            self.pop_schema_token();
        }

        if let Some(any_of) = &schema.any_of {
            let mut any_of_ok = false;
            for &index in any_of {
                if !self.pseudo_exec(self.registry.get_index(index), instance)? {
                    any_of_ok = true;
                    break;
                }
            }

            if !any_of_ok {
                self.keyword_error("anyOf")?;
            }
        }

        if let Some(one_of) = &schema.one_of {
            let mut one_of_ok = false;
            for &index in one_of {
                if !self.pseudo_exec(self.registry.get_index(index), instance)? {
                    if one_of_ok {
                        one_of_ok = false;
                        break;
                    }

                    one_of_ok = true;
                }
            }

            if !one_of_ok {
                self.keyword_error("oneOf")?;
            }
        }

        match instance {
            Value::Null => {
                if !schema.allows_type(JsonType::Null) {
                    self.keyword_error("type")?;
                }
            }
            Value::Bool(_) => {
                if !schema.allows_type(JsonType::Boolean) {
                    self.keyword_error("type")?;
                }
            }
            Value::Number(number) => {
                let value = match number.as_f64() {
                    Some(value) => value,
                    None => return Ok(()),
                };

                if let Some(types) = &schema.type_ {
                    let integer_ok =
                        types.contains(&JsonType::Integer) && value == value.round();

                    if !integer_ok && !types.contains(&JsonType::Number) {
                        self.keyword_error("type")?;
                    }
                }

                if let Some(multiple_of) = schema.multiple_of {
                    if (value % multiple_of).abs() > EPSILON {
                        self.keyword_error("multipleOf")?;
                    }
                }

                if let Some(maximum) = schema.maximum {
                    if value > maximum {
                        self.keyword_error("maximum")?;
                    }
                }

                if let Some(minimum) = schema.minimum {
                    if value < minimum {
                        self.keyword_error("minimum")?;
                    }
                }

                if let Some(exclusive_maximum) = schema.exclusive_maximum {
                    if value > exclusive_maximum - EPSILON {
                        self.keyword_error("exclusiveMaximum")?;
                    }
                }

                if let Some(exclusive_minimum) = schema.exclusive_minimum {
                    if value < exclusive_minimum + EPSILON {
                        self.keyword_error("exclusiveMinimum")?;
                    }
                }
            }
            Value::String(value) => {
                if !schema.allows_type(JsonType::String) {
                    self.keyword_error("type")?;
                }

                if let Some(max_length) = schema.max_length {
                    if value.chars().count() > max_length {
                        self.keyword_error("maxLength")?;
                    }
                }

                if let Some(min_length) = schema.min_length {
                    if value.chars().count() < min_length {
                        self.keyword_error("minLength")?;
                    }
                }

                if let Some(pattern) = &schema.pattern {
                    if !pattern.is_match(value) {
                        self.keyword_error("pattern")?;
                    }
                }
            }
            Value::Array(elements) => {
                if !schema.allows_type(JsonType::Array) {
                    self.keyword_error("type")?;
                }

                if let Some(max_items) = schema.max_items {
                    if elements.len() > max_items {
                        self.keyword_error("maxItems")?;
                    }
                }

                if let Some(min_items) = schema.min_items {
                    if elements.len() < min_items {
                        self.keyword_error("minItems")?;
                    }
                }

                if schema.unique_items == Some(true) {
                    'unique: for i in 0..elements.len() {
                        for j in i + 1..elements.len() {
                            if deep_equal(&elements[i], &elements[j]) {
                                self.keyword_error("uniqueItems")?;
                                break 'unique;
                            }
                        }
                    }
                }

                if let Some(index) = schema.contains {
                    let contains_schema = self.registry.get_index(index);

                    let mut contains_ok = false;
                    for element in elements {
                        if !self.pseudo_exec(contains_schema, element)? {
                            contains_ok = true;
                            break;
                        }
                    }

                    if !contains_ok {
                        self.keyword_error("contains")?;
                    }
                }

                match &schema.items {
                    Some(Items::Single(index)) => {
                        self.push_schema_token("items");

                        let item_schema = self.registry.get_index(*index);
                        for (i, element) in elements.iter().enumerate() {
                            self.push_instance_token(&i.to_string());
                            self.exec_schema(item_schema, element)?;
                            self.pop_instance_token();
                        }

                        self.pop_schema_token();
                    }
                    Some(Items::Tuple(indices)) => {
                        self.push_schema_token("items");

                        for (i, (&index, element)) in indices.iter().zip(elements).enumerate() {
                            let token = i.to_string();

                            self.push_instance_token(&token);
                            self.push_schema_token(&token);
                            self.exec_schema(self.registry.get_index(index), element)?;
                            self.pop_schema_token();
                            self.pop_instance_token();
                        }

                        self.pop_schema_token();

                        if let Some(additional) = schema.additional_items {
                            self.push_schema_token("additionalItems");

                            let additional_schema = self.registry.get_index(additional);
                            for (i, element) in elements.iter().enumerate().skip(indices.len()) {
                                self.push_instance_token(&i.to_string());
                                self.exec_schema(additional_schema, element)?;
                                self.pop_instance_token();
                            }

                            self.pop_schema_token();
                        }
                    }
                    None => {}
                }
            }
            Value::Object(members) => {
                if !schema.allows_type(JsonType::Object) {
                    self.keyword_error("type")?;
                }

                if let Some(max_properties) = schema.max_properties {
                    if members.len() > max_properties {
                        self.keyword_error("maxProperties")?;
                    }
                }

                if let Some(min_properties) = schema.min_properties {
                    if members.len() < min_properties {
                        self.keyword_error("minProperties")?;
                    }
                }

                if let Some(required) = &schema.required {
                    self.push_schema_token("required");

                    for (i, name) in required.iter().enumerate() {
                        if !members.contains_key(name) {
                            self.keyword_error(&i.to_string())?;
                        }
                    }

                    self.pop_schema_token();
                }

                for (name, value) in members {
                    let mut additional = true;

                    if let Some(properties) = &schema.properties {
                        if let Some(&index) = properties.get(name) {
                            additional = false;

                            self.push_schema_token("properties");
                            self.push_schema_token(name);
                            self.push_instance_token(name);
                            self.exec_schema(self.registry.get_index(index), value)?;
                            self.pop_instance_token();
                            self.pop_schema_token();
                            self.pop_schema_token();
                        }
                    }

                    if let Some(pattern_properties) = &schema.pattern_properties {
                        for (pattern, index) in pattern_properties {
                            if pattern.is_match(name) {
                                additional = false;

                                self.push_schema_token("patternProperties");
                                self.push_schema_token(pattern.as_str());
                                self.push_instance_token(name);
                                self.exec_schema(self.registry.get_index(*index), value)?;
                                self.pop_instance_token();
                                self.pop_schema_token();
                                self.pop_schema_token();
                            }
                        }
                    }

                    if additional {
                        if let Some(index) = schema.additional_properties {
                            self.push_schema_token("additionalProperties");
                            self.push_instance_token(name);
                            self.exec_schema(self.registry.get_index(index), value)?;
                            self.pop_instance_token();
                            self.pop_schema_token();
                        }
                    }
                }

                if let Some(dependencies) = &schema.dependencies {
                    self.push_schema_token("dependencies");

                    for (name, dependency) in dependencies {
                        self.push_schema_token(name);

                        if members.contains_key(name) {
                            match dependency {
                                Dependency::Schema(index) => {
                                    self.exec_schema(self.registry.get_index(*index), instance)?;
                                }
                                Dependency::Properties(names) => {
                                    for (i, required_name) in names.iter().enumerate() {
                                        if !members.contains_key(required_name) {
                                            self.keyword_error(&i.to_string())?;
                                        }
                                    }
                                }
                            }
                        }

                        self.pop_schema_token();
                    }

                    self.pop_schema_token();
                }

                if let Some(index) = schema.property_names {
                    self.push_schema_token("propertyNames");

                    let name_schema = self.registry.get_index(index);
                    for name in members.keys() {
                        let name_value = Value::String(name.clone());

                        self.push_instance_token(name);
                        self.exec_schema(name_schema, &name_value)?;
                        self.pop_instance_token();
                    }

                    self.pop_schema_token();
                }
            }
        }

        Ok(())
    }

    /// Runs `schema` against `instance` to learn whether it rejects, leaving
    /// the vm exactly as it was: errors go to a throwaway list that is
    /// dropped on every exit path, and the max-errors cap is suspended since
    /// nothing here reaches the visible list.
    fn pseudo_exec(&mut self, schema: &Schema, instance: &Value) -> Result<bool, VmError> {
        let saved = mem::take(&mut self.errors);
        self.pseudo_depth += 1;

        let outcome = self.exec_schema(schema, instance);

        self.pseudo_depth -= 1;
        let found_errors = !self.errors.is_empty();
        self.errors = saved;

        outcome.map(|()| found_errors)
    }

    fn keyword_error(&mut self, token: &str) -> Result<(), VmError> {
        self.push_schema_token(token);
        let outcome = self.report_error();
        self.pop_schema_token();
        outcome
    }

    fn report_error(&mut self) -> Result<(), VmError> {
        let frame = self.frames.last().unwrap();

        self.errors.push(ValidationError {
            instance_path: Pointer::from_tokens(self.instance_tokens.clone()),
            schema_path: Pointer::from_tokens(frame.tokens.clone()),
            uri: frame.id.clone(),
        });

        if self.pseudo_depth == 0 && self.max_errors > 0 && self.errors.len() >= self.max_errors {
            return Err(VmError::MaxErrorsReached);
        }

        Ok(())
    }

    fn push_schema_token(&mut self, token: &str) {
        self.frames.last_mut().unwrap().tokens.push(token.to_owned());
    }

    fn pop_schema_token(&mut self) {
        self.frames.last_mut().unwrap().tokens.pop().unwrap();
    }

    fn push_instance_token(&mut self, token: &str) {
        self.instance_tokens.push(token.to_owned());
    }

    fn pop_instance_token(&mut self) {
        self.instance_tokens.pop().unwrap();
    }
}

#[cfg(test)]
mod tests {
    use crate::{Config, Validator};
    use serde_json::{json, Value};

    fn error_paths(schema: Value, instance: Value) -> Vec<String> {
        let validator = Validator::new(&[schema]).unwrap();
        validator
            .validate_default(&instance)
            .unwrap()
            .errors
            .iter()
            .map(|error| error.schema_path.to_string())
            .collect()
    }

    #[test]
    fn multiple_of_tolerates_representation_noise() {
        assert_eq!(Vec::<String>::new(), error_paths(json!({"multipleOf": 2}), json!(6)));
        assert_eq!(
            Vec::<String>::new(),
            error_paths(json!({"multipleOf": 2}), json!(6.0005))
        );
        assert_eq!(
            vec!["/multipleOf"],
            error_paths(json!({"multipleOf": 2}), json!(6.002))
        );
        assert_eq!(vec!["/multipleOf"], error_paths(json!({"multipleOf": 2}), json!(7)));
    }

    #[test]
    fn exclusive_bounds_use_epsilon() {
        let schema = json!({"exclusiveMaximum": 10});
        assert_eq!(vec!["/exclusiveMaximum"], error_paths(schema.clone(), json!(10)));
        assert_eq!(vec!["/exclusiveMaximum"], error_paths(schema.clone(), json!(9.9995)));
        assert_eq!(Vec::<String>::new(), error_paths(schema, json!(9.9985)));

        let schema = json!({"exclusiveMinimum": 5});
        assert_eq!(vec!["/exclusiveMinimum"], error_paths(schema.clone(), json!(5)));
        assert_eq!(vec!["/exclusiveMinimum"], error_paths(schema.clone(), json!(5.0005)));
        assert_eq!(Vec::<String>::new(), error_paths(schema, json!(5.0015)));
    }

    #[test]
    fn integer_type_accepts_whole_floats() {
        let schema = json!({"type": "integer"});
        assert_eq!(Vec::<String>::new(), error_paths(schema.clone(), json!(2)));
        assert_eq!(Vec::<String>::new(), error_paths(schema.clone(), json!(2.0)));
        assert_eq!(vec!["/type"], error_paths(schema, json!(2.5)));
    }

    #[test]
    fn pseudo_exec_emits_no_nested_errors() {
        // The failing branches of anyOf must not leak their own errors; only
        // the single anyOf error is visible.
        assert_eq!(
            vec!["/anyOf"],
            error_paths(
                json!({"anyOf": [{"type": "string"}, {"type": "integer"}]}),
                json!(1.5)
            )
        );
    }

    #[test]
    fn ref_does_not_short_circuit_siblings() {
        let schema = json!({
            "defs": {"a": {"type": "integer"}},
            "$ref": "#/defs/a",
            "minimum": 5
        });

        assert_eq!(vec!["/minimum"], error_paths(schema.clone(), json!(3)));
        assert_eq!(vec!["/defs/a/type", "/minimum"], error_paths(schema, json!(4.5)));
    }

    #[test]
    fn self_reference_overflows_on_any_instance() {
        let validator = Validator::new(&[json!({"$ref": "#"})]).unwrap();

        for instance in [json!(null), json!([1, 2]), json!({"a": true})] {
            let result = validator.validate_default(&instance).unwrap();
            assert!(result.overflowed);
            assert!(result.errors.is_empty());
            assert!(!result.is_valid());
        }
    }

    #[test]
    fn max_errors_caps_the_visible_list() {
        let config = Config::new().with_max_errors(3);
        let validator =
            Validator::with_config(config, &[json!({"items": {"type": "string"}})]).unwrap();

        let result = validator
            .validate_default(&json!([1, 2, 3, 4, 5]))
            .unwrap();

        assert_eq!(3, result.errors.len());
        assert!(!result.overflowed);
    }

    #[test]
    fn unique_items_reports_first_offender_once() {
        assert_eq!(
            vec!["/uniqueItems"],
            error_paths(json!({"uniqueItems": true}), json!([1, 2, 1, 2]))
        );
        // Numbers compare by value across representations.
        assert_eq!(
            vec!["/uniqueItems"],
            error_paths(json!({"uniqueItems": true}), json!([1, 1.0]))
        );
    }
}
