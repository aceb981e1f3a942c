//! `mcpgateway_tool`

use tfplug::schema::Schema;
use tfplug::{AttributeBuilder, AttributeType, Diagnostic, DynamicValue, SchemaBuilder};

use super::attrs::{self, StateWriter};
use super::auth::{self, Credentials};
use super::object::{ObjectMapping, ObjectResource};
use crate::api::tools::{Tool, ToolAuth, ToolRequest};

pub const REQUEST_TYPES: [&str; 8] = [
    "GET",
    "POST",
    "PUT",
    "DELETE",
    "PATCH",
    "SSE",
    "STDIO",
    "STREAMABLEHTTP",
];

pub struct ToolMapping;

pub type ToolResource = ObjectResource<ToolMapping>;

impl ToolMapping {
    fn request(plan: &DynamicValue) -> Result<ToolRequest, Diagnostic> {
        Ok(ToolRequest {
            name: Some(attrs::required_string(plan, "name")?),
            url: attrs::string(plan, "url"),
            description: attrs::string(plan, "description"),
            integration_type: attrs::string(plan, "integration_type"),
            request_type: attrs::string(plan, "request_type"),
            headers: attrs::string_map(plan, "headers"),
            input_schema: attrs::json(plan, "input_schema")?,
            annotations: attrs::json(plan, "annotations")?,
            jsonpath_filter: attrs::string(plan, "jsonpath_filter"),
            auth: tool_auth(Credentials::from_plan(plan)),
            tags: attrs::string_list(plan, "tags"),
            visibility: attrs::string(plan, "visibility"),
            team_id: attrs::string(plan, "team_id"),
        })
    }
}

/// Tools nest their credentials under `auth`
fn tool_auth(credentials: Credentials) -> Option<ToolAuth> {
    let auth_type = credentials.auth_type?;
    Some(ToolAuth {
        auth_type,
        username: credentials.username,
        password: credentials.password,
        token: credentials.token,
        auth_header_key: credentials.header_key,
        auth_header_value: credentials.header_value,
    })
}

impl ObjectMapping for ToolMapping {
    type Object = Tool;

    const TYPE_NAME: &'static str = "mcpgateway_tool";

    fn schema() -> Schema {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("A tool exposed through the MCP gateway")
            .attribute(attrs::id_attribute("tool"))
            .attribute(attrs::name_attribute("tool"))
            .attribute(attrs::computed(
                "display_name",
                AttributeType::String,
                "Human readable name derived by the gateway",
            ))
            .attribute(attrs::url_attribute(
                "url",
                "Endpoint the gateway calls for REST tools",
                false,
            ))
            .attribute(attrs::optional_string("description", "Description of the tool"))
            .attribute(attrs::one_of(
                "integration_type",
                "How the tool is integrated: REST, MCP or A2A",
                &["REST", "MCP", "A2A"],
                "REST",
            ))
            .attribute(attrs::one_of(
                "request_type",
                "HTTP method or transport used to invoke the tool",
                &REQUEST_TYPES,
                "POST",
            ))
            .attribute(
                AttributeBuilder::new("headers", AttributeType::map(AttributeType::String))
                    .description("Extra headers sent with every invocation")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(attrs::free_form(
                "input_schema",
                "JSON schema describing the tool input",
            ))
            .attribute(attrs::free_form("annotations", "MCP tool annotations"))
            .attribute(attrs::optional_string(
                "jsonpath_filter",
                "JSONPath expression applied to the tool output",
            ));
        for attribute in auth::attributes() {
            builder = builder.attribute(attribute);
        }
        builder
            .attribute(attrs::computed(
                "gateway_id",
                AttributeType::String,
                "Federated gateway the tool was discovered from",
            ))
            .attribute(attrs::tags_attribute())
            .attribute(attrs::visibility_attribute())
            .attribute(attrs::team_id_attribute())
            .attribute(attrs::owner_email_attribute())
            .attribute(attrs::enabled_attribute())
            .attribute(attrs::computed(
                "reachable",
                AttributeType::Bool,
                "Whether the gateway could reach the tool on its last check",
            ))
            .attribute(attrs::created_at_attribute())
            .attribute(attrs::updated_at_attribute())
            .build()
    }

    fn create_request(plan: &DynamicValue) -> Result<ToolRequest, Diagnostic> {
        Self::request(plan)
    }

    fn update_request(plan: &DynamicValue) -> Result<ToolRequest, Diagnostic> {
        Self::request(plan)
    }

    fn write_state(tool: &Tool, state: &mut StateWriter<'_>) {
        // The gateway slugifies `name`; the submitted name is kept separately
        let name = tool.original_name.as_deref().unwrap_or(&tool.name);
        state
            .string("name", Some(name))
            .string("display_name", tool.display_name.as_deref())
            .string("url", tool.url.as_deref())
            .string("description", tool.description.as_deref())
            .string("integration_type", tool.integration_type.as_deref())
            .string("request_type", tool.request_type.as_deref())
            .string_map("headers", tool.headers.as_ref())
            .json("input_schema", tool.input_schema.as_ref())
            .json("annotations", tool.annotations.as_ref())
            .string("jsonpath_filter", tool.jsonpath_filter.as_deref())
            .string("gateway_id", tool.gateway_id.as_deref())
            .strings("tags", &tool.tags)
            .string("visibility", tool.visibility.as_deref())
            .string("team_id", tool.team_id.as_deref())
            .string("owner_email", tool.owner_email.as_deref())
            .bool("enabled", tool.active.value())
            .bool("reachable", tool.reachable)
            .string("created_at", tool.created_at.as_deref())
            .string("updated_at", tool.updated_at.as_deref());
    }

    fn enabled(tool: &Tool) -> Option<bool> {
        tool.active.value()
    }

    fn validate(config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = auth::validate(config);
        let rest = attrs::string(config, "integration_type")
            .map_or(true, |integration| integration == "REST");
        let url_missing = matches!(
            config.get(&attrs::path("url")),
            None | Some(tfplug::Dynamic::Null)
        );
        if rest && url_missing {
            diagnostics.push(
                Diagnostic::error("Missing url", "REST tools need a url to call")
                    .with_attribute(attrs::path("url")),
            );
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tfplug::Dynamic;

    fn plan() -> DynamicValue {
        let mut plan = DynamicValue::object();
        plan.set_string(&attrs::path("name"), "weather").unwrap();
        plan.set_string(&attrs::path("url"), "https://api.example.com/weather")
            .unwrap();
        plan.set_string(&attrs::path("request_type"), "GET").unwrap();
        plan.mark_unknown(&attrs::path("description")).unwrap();
        plan.set_string(&attrs::path("auth_type"), "bearer").unwrap();
        plan.set_string(&attrs::path("auth_token"), "s3cret").unwrap();
        plan.set_bool(&attrs::path("enabled"), true).unwrap();
        plan
    }

    #[test]
    fn request_copies_planned_values() {
        let request = ToolMapping::create_request(&plan()).unwrap();
        assert_eq!(request.name.as_deref(), Some("weather"));
        assert_eq!(request.request_type.as_deref(), Some("GET"));
        assert_eq!(request.description, None);
        let auth = request.auth.unwrap();
        assert_eq!(auth.auth_type, "bearer");
        assert_eq!(auth.token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn request_without_name_fails() {
        let mut plan = plan();
        plan.set_null(&attrs::path("name")).unwrap();
        let err = ToolMapping::create_request(&plan).unwrap_err();
        assert_eq!(err.attribute, Some(attrs::path("name")));
    }

    #[test]
    fn write_state_prefers_original_name_and_keeps_secrets() {
        let tool: Tool = serde_json::from_value(serde_json::json!({
            "id": "t-1",
            "name": "weather-lookup",
            "originalName": "weather lookup",
            "inputSchema": {"type": "object"},
            "tags": ["a"],
            "enabled": true
        }))
        .unwrap();

        let mut state = plan();
        let mut writer = StateWriter::new(&mut state);
        ToolMapping::write_state(&tool, &mut writer);
        assert!(writer.into_diagnostics().is_empty());

        assert_eq!(
            attrs::string(&state, "name").as_deref(),
            Some("weather lookup")
        );
        assert_eq!(attrs::string(&state, "auth_token").as_deref(), Some("s3cret"));
        let mut expected = HashMap::new();
        expected.insert("type".to_string(), Dynamic::String("object".to_string()));
        assert_eq!(
            state.get(&attrs::path("input_schema")),
            Some(&Dynamic::Map(expected))
        );
    }

    #[test]
    fn schema_marks_secrets_sensitive() {
        let schema = ToolMapping::schema();
        for name in ["auth_password", "auth_token", "auth_header_value"] {
            let attribute = schema.attribute(name).unwrap();
            assert!(attribute.sensitive, "{} should be sensitive", name);
            assert!(!attribute.computed);
        }
        assert!(schema.attribute("name").unwrap().required);
        assert!(schema.attribute("request_type").unwrap().default.is_some());
    }

    #[test]
    fn rest_tools_need_a_url() {
        let mut config = plan();
        config.set_null(&attrs::path("url")).unwrap();
        let diagnostics = ToolMapping::validate(&config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Missing url");

        config
            .set_string(&attrs::path("integration_type"), "MCP")
            .unwrap();
        assert!(ToolMapping::validate(&config).is_empty());
    }
}
