//! `mcpgateway_server`: a virtual server bundling tools, resources and prompts

use tfplug::schema::Schema;
use tfplug::{Diagnostic, DynamicValue, SchemaBuilder};

use super::attrs::{self, StateWriter};
use super::object::{ObjectMapping, ObjectResource};
use crate::api::servers::{Server, ServerRequest};

pub struct ServerMapping;

pub type ServerResource = ObjectResource<ServerMapping>;

impl ServerMapping {
    fn request(plan: &DynamicValue) -> Result<ServerRequest, Diagnostic> {
        Ok(ServerRequest {
            name: Some(attrs::required_string(plan, "name")?),
            description: attrs::string(plan, "description"),
            icon: attrs::string(plan, "icon"),
            associated_tools: attrs::string_list(plan, "associated_tools"),
            associated_resources: attrs::string_list(plan, "associated_resources"),
            associated_prompts: attrs::string_list(plan, "associated_prompts"),
            associated_a2a_agents: attrs::string_list(plan, "associated_a2a_agents"),
            tags: attrs::string_list(plan, "tags"),
            visibility: attrs::string(plan, "visibility"),
            team_id: attrs::string(plan, "team_id"),
        })
    }
}

impl ObjectMapping for ServerMapping {
    type Object = Server;

    const TYPE_NAME: &'static str = "mcpgateway_server";

    fn schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("A virtual MCP server composed from gateway objects")
            .attribute(attrs::id_attribute("server"))
            .attribute(attrs::name_attribute("server"))
            .attribute(attrs::optional_string("description", "Description of the server"))
            .attribute(attrs::url_attribute("icon", "URL of the server icon", false))
            .attribute(attrs::string_list_attribute(
                "associated_tools",
                "IDs of the tools served",
            ))
            .attribute(attrs::string_list_attribute(
                "associated_resources",
                "IDs of the resources served",
            ))
            .attribute(attrs::string_list_attribute(
                "associated_prompts",
                "IDs of the prompts served",
            ))
            .attribute(attrs::string_list_attribute(
                "associated_a2a_agents",
                "IDs of the A2A agents served",
            ))
            .attribute(attrs::tags_attribute())
            .attribute(attrs::visibility_attribute())
            .attribute(attrs::team_id_attribute())
            .attribute(attrs::owner_email_attribute())
            .attribute(attrs::enabled_attribute())
            .attribute(attrs::created_at_attribute())
            .attribute(attrs::updated_at_attribute())
            .build()
    }

    fn create_request(plan: &DynamicValue) -> Result<ServerRequest, Diagnostic> {
        Self::request(plan)
    }

    fn update_request(plan: &DynamicValue) -> Result<ServerRequest, Diagnostic> {
        Self::request(plan)
    }

    fn write_state(server: &Server, state: &mut StateWriter<'_>) {
        state
            .string("name", Some(&server.name))
            .string("description", server.description.as_deref())
            .string("icon", server.icon.as_deref())
            .strings("associated_tools", &server.associated_tools)
            .strings("associated_resources", &server.associated_resources)
            .strings("associated_prompts", &server.associated_prompts)
            .strings("associated_a2a_agents", &server.associated_a2a_agents)
            .strings("tags", &server.tags)
            .string("visibility", server.visibility.as_deref())
            .string("team_id", server.team_id.as_deref())
            .string("owner_email", server.owner_email.as_deref())
            .bool("enabled", server.active.value())
            .string("created_at", server.created_at.as_deref())
            .string("updated_at", server.updated_at.as_deref());
    }

    fn enabled(server: &Server) -> Option<bool> {
        server.active.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_state_maps_is_active_to_enabled() {
        let server: Server = serde_json::from_value(serde_json::json!({
            "id": "s-1",
            "name": "toolbox",
            "associatedTools": ["t-1"],
            "isActive": false
        }))
        .unwrap();

        let mut state = DynamicValue::object();
        let mut writer = StateWriter::new(&mut state);
        ServerMapping::write_state(&server, &mut writer);

        assert_eq!(attrs::bool(&state, "enabled"), Some(false));
        assert_eq!(
            attrs::string_list(&state, "associated_tools"),
            Some(vec!["t-1".to_string()])
        );
        assert_eq!(attrs::string_list(&state, "associated_prompts"), Some(vec![]));
    }

    #[test]
    fn unknown_associations_are_omitted() {
        let mut plan = DynamicValue::object();
        plan.set_string(&attrs::path("name"), "toolbox").unwrap();
        plan.mark_unknown(&attrs::path("associated_tools")).unwrap();

        let body = serde_json::to_value(ServerMapping::create_request(&plan).unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"name": "toolbox"}));
    }
}
