//! `mcpgateway_gateway`: a federated MCP server

use tfplug::schema::Schema;
use tfplug::{AttributeType, Diagnostic, DynamicValue, SchemaBuilder};

use super::attrs::{self, StateWriter};
use super::auth::{self, Credentials};
use super::object::{ObjectMapping, ObjectResource};
use crate::api::gateways::{Gateway, GatewayRequest};

pub struct GatewayMapping;

pub type GatewayResource = ObjectResource<GatewayMapping>;

impl GatewayMapping {
    fn request(plan: &DynamicValue) -> Result<GatewayRequest, Diagnostic> {
        let credentials = Credentials::from_plan(plan);
        Ok(GatewayRequest {
            name: Some(attrs::required_string(plan, "name")?),
            url: Some(attrs::required_string(plan, "url")?),
            description: attrs::string(plan, "description"),
            transport: attrs::string(plan, "transport"),
            passthrough_headers: attrs::string_list(plan, "passthrough_headers"),
            auth_type: credentials.auth_type,
            auth_username: credentials.username,
            auth_password: credentials.password,
            auth_token: credentials.token,
            auth_header_key: credentials.header_key,
            auth_header_value: credentials.header_value,
            tags: attrs::string_list(plan, "tags"),
            visibility: attrs::string(plan, "visibility"),
            team_id: attrs::string(plan, "team_id"),
        })
    }
}

impl ObjectMapping for GatewayMapping {
    type Object = Gateway;

    const TYPE_NAME: &'static str = "mcpgateway_gateway";

    fn schema() -> Schema {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("An upstream MCP server federated into the gateway")
            .attribute(attrs::id_attribute("gateway"))
            .attribute(attrs::name_attribute("gateway"))
            .attribute(attrs::computed(
                "slug",
                AttributeType::String,
                "URL-safe name derived by the gateway",
            ))
            .attribute(attrs::url_attribute(
                "url",
                "Endpoint of the upstream MCP server",
                true,
            ))
            .attribute(attrs::optional_string(
                "description",
                "Description of the gateway",
            ))
            .attribute(attrs::one_of(
                "transport",
                "Transport used to reach the upstream server: SSE or STREAMABLEHTTP",
                &["SSE", "STREAMABLEHTTP"],
                "SSE",
            ))
            .attribute(attrs::computed(
                "capabilities",
                AttributeType::Dynamic,
                "Capabilities advertised by the upstream server",
            ))
            .attribute(attrs::string_list_attribute(
                "passthrough_headers",
                "Client headers forwarded to the upstream server",
            ));
        for attribute in auth::attributes() {
            builder = builder.attribute(attribute);
        }
        builder
            .attribute(attrs::tags_attribute())
            .attribute(attrs::visibility_attribute())
            .attribute(attrs::team_id_attribute())
            .attribute(attrs::owner_email_attribute())
            .attribute(attrs::enabled_attribute())
            .attribute(attrs::computed(
                "reachable",
                AttributeType::Bool,
                "Whether the last health check succeeded",
            ))
            .attribute(attrs::computed(
                "last_seen",
                AttributeType::String,
                "Time of the last successful health check",
            ))
            .attribute(attrs::created_at_attribute())
            .attribute(attrs::updated_at_attribute())
            .build()
    }

    fn create_request(plan: &DynamicValue) -> Result<GatewayRequest, Diagnostic> {
        Self::request(plan)
    }

    fn update_request(plan: &DynamicValue) -> Result<GatewayRequest, Diagnostic> {
        Self::request(plan)
    }

    fn write_state(gateway: &Gateway, state: &mut StateWriter<'_>) {
        state
            .string("name", Some(&gateway.name))
            .string("slug", gateway.slug.as_deref())
            .string("url", gateway.url.as_deref())
            .string("description", gateway.description.as_deref())
            .string("transport", gateway.transport.as_deref())
            .json("capabilities", gateway.capabilities.as_ref())
            .optional_strings("passthrough_headers", gateway.passthrough_headers.as_deref())
            .strings("tags", &gateway.tags)
            .string("visibility", gateway.visibility.as_deref())
            .string("team_id", gateway.team_id.as_deref())
            .string("owner_email", gateway.owner_email.as_deref())
            .bool("enabled", gateway.active.value())
            .bool("reachable", gateway.reachable)
            .string("last_seen", gateway.last_seen.as_deref())
            .string("created_at", gateway.created_at.as_deref())
            .string("updated_at", gateway.updated_at.as_deref());
    }

    fn enabled(gateway: &Gateway) -> Option<bool> {
        gateway.active.value()
    }

    fn validate(config: &DynamicValue) -> Vec<Diagnostic> {
        auth::validate(config)
    }
}
