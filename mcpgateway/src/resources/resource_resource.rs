//! `mcpgateway_resource`: an MCP resource served by the gateway

use tfplug::plan_modifier::RequiresReplace;
use tfplug::schema::Schema;
use tfplug::{AttributeBuilder, AttributeType, Diagnostic, DynamicValue, SchemaBuilder};

use super::attrs::{self, StateWriter};
use super::object::{ObjectMapping, ObjectResource};
use crate::api::resources::{McpResource, ResourceCreateRequest, ResourceUpdateRequest};

pub struct ResourceMapping;

pub type ResourceResource = ObjectResource<ResourceMapping>;

impl ObjectMapping for ResourceMapping {
    type Object = McpResource;

    const TYPE_NAME: &'static str = "mcpgateway_resource";

    fn schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("A static MCP resource hosted by the gateway")
            .attribute(attrs::id_attribute("resource"))
            .attribute(
                AttributeBuilder::new("uri", AttributeType::String)
                    .description("URI identifying the resource; changing it forces a new resource")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(attrs::name_attribute("resource"))
            .attribute(attrs::optional_string(
                "description",
                "Description of the resource",
            ))
            .attribute(attrs::optional_string(
                "mime_type",
                "MIME type of the content",
            ))
            .attribute(
                AttributeBuilder::new("content", AttributeType::String)
                    .description("Content of the resource; never read back from the gateway")
                    .required()
                    .sensitive()
                    .build(),
            )
            .attribute(attrs::computed(
                "size",
                AttributeType::Number,
                "Size of the content in bytes",
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

    fn create_request(plan: &DynamicValue) -> Result<ResourceCreateRequest, Diagnostic> {
        Ok(ResourceCreateRequest {
            uri: attrs::required_string(plan, "uri")?,
            name: attrs::required_string(plan, "name")?,
            content: attrs::required_string(plan, "content")?,
            description: attrs::string(plan, "description"),
            mime_type: attrs::string(plan, "mime_type"),
            tags: attrs::string_list(plan, "tags"),
            visibility: attrs::string(plan, "visibility"),
            team_id: attrs::string(plan, "team_id"),
        })
    }

    fn update_request(plan: &DynamicValue) -> Result<ResourceUpdateRequest, Diagnostic> {
        Ok(ResourceUpdateRequest {
            name: Some(attrs::required_string(plan, "name")?),
            content: attrs::string(plan, "content"),
            description: attrs::string(plan, "description"),
            mime_type: attrs::string(plan, "mime_type"),
            tags: attrs::string_list(plan, "tags"),
            visibility: attrs::string(plan, "visibility"),
            team_id: attrs::string(plan, "team_id"),
        })
    }

    fn write_state(resource: &McpResource, state: &mut StateWriter<'_>) {
        state
            .string("uri", Some(&resource.uri))
            .string("name", Some(&resource.name))
            .string("description", resource.description.as_deref())
            .string("mime_type", resource.mime_type.as_deref())
            .count("size", resource.size)
            .strings("tags", &resource.tags)
            .string("visibility", resource.visibility.as_deref())
            .string("team_id", resource.team_id.as_deref())
            .string("owner_email", resource.owner_email.as_deref())
            .bool("enabled", resource.active.value())
            .string("created_at", resource.created_at.as_deref())
            .string("updated_at", resource.updated_at.as_deref());
    }

    fn enabled(resource: &McpResource) -> Option<bool> {
        resource.active.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_change_forces_replacement() {
        let schema = ResourceMapping::schema();
        assert_eq!(schema.attribute("uri").unwrap().plan_modifiers.len(), 1);
        let content = schema.attribute("content").unwrap();
        assert!(content.sensitive && content.required);
    }

    #[test]
    fn update_never_sends_uri() {
        let mut plan = DynamicValue::object();
        plan.set_string(&attrs::path("uri"), "docs://readme").unwrap();
        plan.set_string(&attrs::path("name"), "readme").unwrap();
        plan.set_string(&attrs::path("content"), "# Hello").unwrap();
        plan.set_string(&attrs::path("team_id"), "team-b").unwrap();

        let body = serde_json::to_value(ResourceMapping::update_request(&plan).unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"name": "readme", "content": "# Hello", "team_id": "team-b"})
        );
    }

    #[test]
    fn content_survives_a_read() {
        let resource: McpResource = serde_json::from_value(serde_json::json!({
            "id": 5,
            "uri": "docs://readme",
            "name": "readme",
            "size": 7
        }))
        .unwrap();

        let mut state = DynamicValue::object();
        state.set_string(&attrs::path("content"), "# Hello").unwrap();
        let mut writer = StateWriter::new(&mut state);
        ResourceMapping::write_state(&resource, &mut writer);

        assert_eq!(attrs::string(&state, "content").as_deref(), Some("# Hello"));
        assert_eq!(attrs::count(&state, "size"), Some(7));
    }
}
