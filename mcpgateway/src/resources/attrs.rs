//! Attribute plumbing shared by the object mappings
//!
//! Readers pull request fields out of a planned state, where null and
//! unknown both mean "not set". `StateWriter` copies API responses back;
//! fields the gateway leaves out keep whatever the plan or prior state had.

use crate::api::ApiError;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tfplug::convert::{dynamic_to_json, json_to_dynamic};
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::schema::{Attribute, Validator, ValidatorRequest, ValidatorResponse};
use tfplug::validator::{StringLengthValidator, StringOneOfValidator};
use tfplug::{AttributeBuilder, AttributePath, AttributeType, Diagnostic, Dynamic, DynamicValue};

pub fn path(name: &str) -> AttributePath {
    AttributePath::new(name)
}

pub fn string(value: &DynamicValue, name: &str) -> Option<String> {
    value.get_string_opt(&path(name))
}

pub fn required_string(value: &DynamicValue, name: &str) -> Result<String, Diagnostic> {
    string(value, name).ok_or_else(|| {
        Diagnostic::error(
            "Missing required attribute",
            format!("The \"{}\" attribute must be set", name),
        )
        .with_attribute(path(name))
    })
}

pub fn bool(value: &DynamicValue, name: &str) -> Option<bool> {
    value.get_bool_opt(&path(name))
}

pub fn count(value: &DynamicValue, name: &str) -> Option<u64> {
    value
        .get_i64_opt(&path(name))
        .and_then(|n| u64::try_from(n).ok())
}

pub fn string_list(value: &DynamicValue, name: &str) -> Option<Vec<String>> {
    value.get_string_list_opt(&path(name))
}

pub fn string_map(value: &DynamicValue, name: &str) -> Option<HashMap<String, String>> {
    value.get_string_map_opt(&path(name))
}

/// Free-form attribute as JSON; null and unknown read as absent
pub fn json(value: &DynamicValue, name: &str) -> Result<Option<JsonValue>, Diagnostic> {
    match value.get(&path(name)) {
        None | Some(Dynamic::Null) | Some(Dynamic::Unknown) => Ok(None),
        Some(v) => dynamic_to_json(v).map(Some).map_err(|e| {
            Diagnostic::error(
                format!("Invalid value for {}", name),
                format!("Value cannot be sent to the gateway: {}", e),
            )
            .with_attribute(path(name))
        }),
    }
}

/// Copies API response fields into a state value
pub struct StateWriter<'a> {
    state: &'a mut DynamicValue,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> StateWriter<'a> {
    pub fn new(state: &'a mut DynamicValue) -> Self {
        Self {
            state,
            diagnostics: Vec::new(),
        }
    }

    fn set(&mut self, name: &str, value: Dynamic) -> &mut Self {
        if let Err(e) = self.state.set_value(&path(name), value) {
            self.diagnostics.push(
                Diagnostic::error(format!("Failed to set {}", name), e.to_string())
                    .with_attribute(path(name)),
            );
        }
        self
    }

    /// Value currently held in state, before this writer touched it
    pub fn current(&self, name: &str) -> Option<&Dynamic> {
        self.state.get(&path(name))
    }

    pub fn string(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(v) => self.set(name, Dynamic::String(v.to_string())),
            None => self,
        }
    }

    pub fn bool(&mut self, name: &str, value: Option<bool>) -> &mut Self {
        match value {
            Some(v) => self.set(name, Dynamic::Bool(v)),
            None => self,
        }
    }

    pub fn count(&mut self, name: &str, value: Option<u64>) -> &mut Self {
        match value {
            Some(v) => self.set(name, Dynamic::Number(v as f64)),
            None => self,
        }
    }

    /// Lists always come back from the gateway, so an empty list is written too
    pub fn strings(&mut self, name: &str, values: &[String]) -> &mut Self {
        let list = values.iter().cloned().map(Dynamic::String).collect();
        self.set(name, Dynamic::List(list))
    }

    pub fn optional_strings(&mut self, name: &str, values: Option<&[String]>) -> &mut Self {
        match values {
            Some(values) => self.strings(name, values),
            None => self,
        }
    }

    pub fn string_map(&mut self, name: &str, values: Option<&HashMap<String, String>>) -> &mut Self {
        match values {
            Some(values) => {
                let map = values
                    .iter()
                    .map(|(k, v)| (k.clone(), Dynamic::String(v.clone())))
                    .collect();
                self.set(name, Dynamic::Map(map))
            }
            None => self,
        }
    }

    pub fn json(&mut self, name: &str, value: Option<&JsonValue>) -> &mut Self {
        match value.map(json_to_dynamic) {
            Some(Ok(converted)) => self.set(name, converted),
            Some(Err(e)) => {
                self.diagnostics.push(
                    Diagnostic::error(format!("Unsupported value for {}", name), e.to_string())
                        .with_attribute(path(name)),
                );
                self
            }
            None => self,
        }
    }

    pub fn value(&mut self, name: &str, value: Dynamic) -> &mut Self {
        self.set(name, value)
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Turns an API failure into diagnostics, one per reported field
pub fn api_error_diagnostics(summary: &str, err: &ApiError) -> Vec<Diagnostic> {
    let mut diagnostics = vec![Diagnostic::error(summary, format!("API error: {}", err))];
    for (field, messages) in err.field_errors() {
        if field.is_empty() {
            continue;
        }
        let root = field.split('.').next().unwrap_or(&field).to_string();
        diagnostics.push(
            Diagnostic::error(format!("Invalid {}", field), messages.join("; "))
                .with_attribute(path(&root)),
        );
    }
    diagnostics
}

/// Accepts absolute http and https URLs
pub struct HttpUrlValidator;

impl Validator for HttpUrlValidator {
    fn description(&self) -> String {
        "value must be an absolute http or https URL".to_string()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];
        if let Some(s) = request.value.as_string() {
            let valid = url::Url::parse(s)
                .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
                .unwrap_or(false);
            if !valid {
                diagnostics.push(
                    Diagnostic::error(
                        format!("{} must be an http or https URL", request.path),
                        format!("Got {:?}", s),
                    )
                    .with_attribute(request.path.clone()),
                );
            }
        }
        ValidatorResponse { diagnostics }
    }
}

pub fn id_attribute(kind: &str) -> Attribute {
    AttributeBuilder::new("id", AttributeType::String)
        .description(&format!("Identifier of the {}", kind))
        .computed()
        .plan_modifier(UseStateForUnknown)
        .build()
}

pub fn name_attribute(kind: &str) -> Attribute {
    AttributeBuilder::new("name", AttributeType::String)
        .description(&format!("Name of the {}", kind))
        .required()
        .validator(StringLengthValidator::between(1, 255))
        .build()
}

pub fn optional_string(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .computed()
        .build()
}

pub fn computed(name: &str, type_: AttributeType, description: &str) -> Attribute {
    AttributeBuilder::new(name, type_)
        .description(description)
        .computed()
        .build()
}

/// Optional string that is only ever taken from configuration
pub fn config_only(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .build()
}

pub fn secret(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .sensitive()
        .build()
}

pub fn url_attribute(name: &str, description: &str, required: bool) -> Attribute {
    let builder = AttributeBuilder::new(name, AttributeType::String).description(description);
    let builder = if required {
        builder.required()
    } else {
        builder.optional().computed()
    };
    builder.validator(HttpUrlValidator).build()
}

pub fn one_of(name: &str, description: &str, allowed: &[&str], default: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
        .computed()
        .validator(StringOneOfValidator::new(allowed.iter().copied()))
        .default(StaticDefault::string(default))
        .build()
}

pub fn free_form(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::Dynamic)
        .description(description)
        .optional()
        .computed()
        .build()
}

pub fn string_list_attribute(name: &str, description: &str) -> Attribute {
    AttributeBuilder::new(name, AttributeType::list(AttributeType::String))
        .description(description)
        .optional()
        .computed()
        .build()
}

pub fn tags_attribute() -> Attribute {
    string_list_attribute("tags", "Tags used to group and filter objects")
}

pub fn visibility_attribute() -> Attribute {
    one_of(
        "visibility",
        "Who can see the object: public, team or private",
        &["public", "team", "private"],
        "public",
    )
}

pub fn team_id_attribute() -> Attribute {
    optional_string("team_id", "Team owning the object")
}

pub fn owner_email_attribute() -> Attribute {
    computed(
        "owner_email",
        AttributeType::String,
        "Email of the user owning the object",
    )
}

pub fn enabled_attribute() -> Attribute {
    AttributeBuilder::new("enabled", AttributeType::Bool)
        .description("Whether the object is active on the gateway")
        .optional()
        .computed()
        .default(StaticDefault::bool(true))
        .build()
}

pub fn created_at_attribute() -> Attribute {
    AttributeBuilder::new("created_at", AttributeType::String)
        .description("Creation timestamp (RFC 3339)")
        .computed()
        .plan_modifier(UseStateForUnknown)
        .build()
}

pub fn updated_at_attribute() -> Attribute {
    computed(
        "updated_at",
        AttributeType::String,
        "Last modification timestamp (RFC 3339)",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::common::ApiErrorDetails;

    fn validate_url(value: &str) -> ValidatorResponse {
        HttpUrlValidator.validate(ValidatorRequest {
            value: Dynamic::String(value.to_string()),
            path: path("url"),
        })
    }

    #[test]
    fn readers_treat_unknown_as_absent() {
        let mut plan = DynamicValue::object();
        plan.set_string(&path("name"), "echo").unwrap();
        plan.mark_unknown(&path("description")).unwrap();
        plan.set_null(&path("input_schema")).unwrap();

        assert_eq!(string(&plan, "name").as_deref(), Some("echo"));
        assert_eq!(string(&plan, "description"), None);
        assert!(json(&plan, "input_schema").unwrap().is_none());
        assert!(required_string(&plan, "url").is_err());
    }

    #[test]
    fn json_reader_converts_nested_values() {
        let mut plan = DynamicValue::object();
        let mut schema = HashMap::new();
        schema.insert("type".to_string(), Dynamic::String("object".to_string()));
        plan.set_map(&path("input_schema"), schema).unwrap();

        assert_eq!(
            json(&plan, "input_schema").unwrap(),
            Some(serde_json::json!({"type": "object"}))
        );

        plan.set_list(&path("annotations"), vec![Dynamic::Unknown])
            .unwrap();
        assert!(json(&plan, "annotations").is_err());
    }

    #[test]
    fn writer_keeps_values_the_gateway_omits() {
        let mut state = DynamicValue::object();
        state.set_string(&path("description"), "from plan").unwrap();

        let mut writer = StateWriter::new(&mut state);
        writer
            .string("description", None)
            .string("name", Some("echo"))
            .strings("tags", &[])
            .count("size", Some(12))
            .json("annotations", Some(&serde_json::json!({"readOnlyHint": true})));
        assert!(writer.into_diagnostics().is_empty());

        assert_eq!(string(&state, "description").as_deref(), Some("from plan"));
        assert_eq!(string(&state, "name").as_deref(), Some("echo"));
        assert_eq!(string_list(&state, "tags"), Some(vec![]));
        assert_eq!(count(&state, "size"), Some(12));
        assert_eq!(
            json(&state, "annotations").unwrap(),
            Some(serde_json::json!({"readOnlyHint": true}))
        );
    }

    #[test]
    fn url_validator() {
        assert!(validate_url("https://mcp.example.com/sse").diagnostics.is_empty());
        assert!(validate_url("http://localhost:9000").diagnostics.is_empty());
        assert_eq!(validate_url("ftp://files.example.com").diagnostics.len(), 1);
        assert_eq!(validate_url("example.com").diagnostics.len(), 1);
    }

    #[test]
    fn api_errors_point_at_fields() {
        let mut field_errors = HashMap::new();
        field_errors.insert("url".to_string(), vec!["invalid URL".to_string()]);
        let err = ApiError::ApiError {
            status: 422,
            message: "url: invalid URL".to_string(),
            details: Some(Box::new(ApiErrorDetails {
                message: None,
                field_errors,
            })),
        };

        let diagnostics = api_error_diagnostics("Failed to create tool", &err);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].summary, "Failed to create tool");
        assert!(diagnostics[0].detail.contains("url: invalid URL"));
        assert_eq!(diagnostics[1].attribute, Some(path("url")));
    }

    #[test]
    fn fragments_have_expected_flags() {
        let id = id_attribute("tool");
        assert!(id.computed && !id.optional);
        assert_eq!(id.plan_modifiers.len(), 1);

        let enabled = enabled_attribute();
        assert!(enabled.optional && enabled.computed && enabled.default.is_some());

        let token = secret("auth_token", "Bearer token");
        assert!(token.sensitive && !token.computed);
    }
}
