//! Upstream credentials shared by tools and gateways
//!
//! These attributes are write-only: the gateway never returns the secrets,
//! so state keeps whatever was configured.

use tfplug::schema::Attribute;
use tfplug::validator::StringOneOfValidator;
use tfplug::{AttributeBuilder, AttributeType, Diagnostic, Dynamic, DynamicValue};

use super::attrs;

pub const AUTH_TYPES: [&str; 3] = ["basic", "bearer", "authheaders"];

const CREDENTIAL_FIELDS: [&str; 5] = [
    "auth_username",
    "auth_password",
    "auth_token",
    "auth_header_key",
    "auth_header_value",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub auth_type: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub header_key: Option<String>,
    pub header_value: Option<String>,
}

impl Credentials {
    pub fn from_plan(plan: &DynamicValue) -> Self {
        Self {
            auth_type: attrs::string(plan, "auth_type"),
            username: attrs::string(plan, "auth_username"),
            password: attrs::string(plan, "auth_password"),
            token: attrs::string(plan, "auth_token"),
            header_key: attrs::string(plan, "auth_header_key"),
            header_value: attrs::string(plan, "auth_header_value"),
        }
    }
}

pub fn attributes() -> Vec<Attribute> {
    vec![
        AttributeBuilder::new("auth_type", AttributeType::String)
            .description("How the gateway authenticates upstream: basic, bearer or authheaders")
            .optional()
            .validator(StringOneOfValidator::new(AUTH_TYPES))
            .build(),
        attrs::config_only("auth_username", "Username for basic authentication"),
        attrs::secret("auth_password", "Password for basic authentication"),
        attrs::secret("auth_token", "Token for bearer authentication"),
        attrs::config_only("auth_header_key", "Header name for header authentication"),
        attrs::secret("auth_header_value", "Header value for header authentication"),
    ]
}

fn is_null(config: &DynamicValue, name: &str) -> bool {
    matches!(config.get(&attrs::path(name)), None | Some(Dynamic::Null))
}

/// Checks that the credentials required by `auth_type` are present
///
/// Unknown values pass; they are checked again once known.
pub fn validate(config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];

    let auth_type = match config.get(&attrs::path("auth_type")) {
        Some(Dynamic::String(auth_type)) => auth_type.clone(),
        Some(Dynamic::Unknown) => return diagnostics,
        _ => {
            if let Some(name) = CREDENTIAL_FIELDS.iter().find(|name| !is_null(config, name)) {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing auth_type",
                        format!("{} is set but auth_type is not", name),
                    )
                    .with_attribute(attrs::path("auth_type")),
                );
            }
            return diagnostics;
        }
    };

    let required: &[&str] = match auth_type.as_str() {
        "basic" => &["auth_username", "auth_password"],
        "bearer" => &["auth_token"],
        "authheaders" => &["auth_header_key", "auth_header_value"],
        _ => &[],
    };
    for name in required {
        if is_null(config, name) {
            diagnostics.push(
                Diagnostic::error(
                    format!("Missing {}", name),
                    format!("auth_type \"{}\" requires {}", auth_type, name),
                )
                .with_attribute(attrs::path(name)),
            );
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(values: &[(&str, &str)]) -> DynamicValue {
        let mut config = DynamicValue::object();
        for (name, value) in values {
            config.set_string(&attrs::path(name), *value).unwrap();
        }
        config
    }

    #[test]
    fn basic_requires_username_and_password() {
        let diagnostics = validate(&config(&[("auth_type", "basic"), ("auth_username", "svc")]));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Missing auth_password");
    }

    #[test]
    fn bearer_with_token_is_valid() {
        assert!(validate(&config(&[("auth_type", "bearer"), ("auth_token", "abc")])).is_empty());
    }

    #[test]
    fn credentials_without_type_are_rejected() {
        let diagnostics = validate(&config(&[("auth_token", "abc")]));
        assert_eq!(diagnostics[0].summary, "Missing auth_type");
        assert!(validate(&config(&[])).is_empty());
    }

    #[test]
    fn unknown_values_are_deferred() {
        let mut values = config(&[("auth_type", "authheaders")]);
        values.mark_unknown(&attrs::path("auth_header_key")).unwrap();
        values.mark_unknown(&attrs::path("auth_header_value")).unwrap();
        assert!(validate(&values).is_empty());

        let mut values = DynamicValue::object();
        values.mark_unknown(&attrs::path("auth_type")).unwrap();
        assert!(validate(&values).is_empty());
    }

    #[test]
    fn credentials_read_from_plan() {
        let creds = Credentials::from_plan(&config(&[
            ("auth_type", "authheaders"),
            ("auth_header_key", "X-Key"),
            ("auth_header_value", "v"),
        ]));
        assert_eq!(creds.header_key.as_deref(), Some("X-Key"));
        assert_eq!(creds.token, None);
    }
}
