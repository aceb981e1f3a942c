//! `mcpgateway_agent`: an A2A agent registered with the gateway

use tfplug::defaults::StaticDefault;
use tfplug::schema::Schema;
use tfplug::{AttributeBuilder, AttributeType, Diagnostic, Dynamic, DynamicValue, SchemaBuilder};

use super::attrs::{self, StateWriter};
use super::object::{ObjectMapping, ObjectResource};
use crate::api::agents::{Agent, AgentRequest};

pub struct AgentMapping;

pub type AgentResource = ObjectResource<AgentMapping>;

impl AgentMapping {
    fn request(plan: &DynamicValue) -> Result<AgentRequest, Diagnostic> {
        Ok(AgentRequest {
            name: Some(attrs::required_string(plan, "name")?),
            description: attrs::string(plan, "description"),
            endpoint_url: Some(attrs::required_string(plan, "endpoint_url")?),
            agent_type: attrs::string(plan, "agent_type"),
            protocol_version: attrs::string(plan, "protocol_version"),
            capabilities: attrs::json(plan, "capabilities")?,
            config: attrs::json(plan, "config")?,
            auth_type: attrs::string(plan, "auth_type"),
            auth_value: attrs::string(plan, "auth_value"),
            tags: attrs::string_list(plan, "tags"),
            visibility: attrs::string(plan, "visibility"),
            team_id: attrs::string(plan, "team_id"),
        })
    }
}

impl ObjectMapping for AgentMapping {
    type Object = Agent;

    const TYPE_NAME: &'static str = "mcpgateway_agent";

    fn schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("An agent reachable over the A2A protocol")
            .attribute(attrs::id_attribute("agent"))
            .attribute(attrs::name_attribute("agent"))
            .attribute(attrs::computed(
                "slug",
                AttributeType::String,
                "URL-safe name derived by the gateway",
            ))
            .attribute(attrs::optional_string("description", "Description of the agent"))
            .attribute(attrs::url_attribute(
                "endpoint_url",
                "Endpoint the gateway forwards A2A requests to",
                true,
            ))
            .attribute(
                AttributeBuilder::new("agent_type", AttributeType::String)
                    .description("Kind of agent, e.g. generic or openai")
                    .optional()
                    .computed()
                    .default(StaticDefault::string("generic"))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("protocol_version", AttributeType::String)
                    .description("A2A protocol version spoken by the agent")
                    .optional()
                    .computed()
                    .default(StaticDefault::string("1.0"))
                    .build(),
            )
            .attribute(attrs::free_form(
                "capabilities",
                "Capabilities advertised by the agent",
            ))
            .attribute(attrs::free_form("config", "Agent specific configuration"))
            .attribute(attrs::optional_string(
                "auth_type",
                "How the gateway authenticates to the agent",
            ))
            .attribute(attrs::secret(
                "auth_value",
                "Credential matching auth_type; never read back from the gateway",
            ))
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
            .attribute(attrs::created_at_attribute())
            .attribute(attrs::updated_at_attribute())
            .build()
    }

    fn create_request(plan: &DynamicValue) -> Result<AgentRequest, Diagnostic> {
        Self::request(plan)
    }

    fn update_request(plan: &DynamicValue) -> Result<AgentRequest, Diagnostic> {
        Self::request(plan)
    }

    fn write_state(agent: &Agent, state: &mut StateWriter<'_>) {
        state
            .string("name", Some(&agent.name))
            .string("slug", agent.slug.as_deref())
            .string("description", agent.description.as_deref())
            .string("endpoint_url", agent.endpoint_url.as_deref())
            .string("agent_type", agent.agent_type.as_deref())
            .string("protocol_version", agent.protocol_version.as_deref())
            .json("capabilities", agent.capabilities.as_ref())
            .json("config", agent.config.as_ref())
            .string("auth_type", agent.auth_type.as_deref())
            .strings("tags", &agent.tags)
            .string("visibility", agent.visibility.as_deref())
            .string("team_id", agent.team_id.as_deref())
            .string("owner_email", agent.owner_email.as_deref())
            .bool("enabled", agent.active.value())
            .bool("reachable", agent.reachable)
            .string("created_at", agent.created_at.as_deref())
            .string("updated_at", agent.updated_at.as_deref());
    }

    fn enabled(agent: &Agent) -> Option<bool> {
        agent.active.value()
    }

    fn validate(config: &DynamicValue) -> Vec<Diagnostic> {
        let auth_value_set = !matches!(
            config.get(&attrs::path("auth_value")),
            None | Some(Dynamic::Null)
        );
        let auth_type_null = matches!(
            config.get(&attrs::path("auth_type")),
            None | Some(Dynamic::Null)
        );
        if auth_value_set && auth_type_null {
            return vec![Diagnostic::error(
                "Missing auth_type",
                "auth_value is set but auth_type is not",
            )
            .with_attribute(attrs::path("auth_type"))];
        }
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> DynamicValue {
        let mut plan = DynamicValue::object();
        plan.set_string(&attrs::path("name"), "planner").unwrap();
        plan.set_string(
            &attrs::path("endpoint_url"),
            "https://agents.example.com/planner",
        )
        .unwrap();
        plan.set_string(&attrs::path("auth_type"), "bearer").unwrap();
        plan.set_string(&attrs::path("auth_value"), "tok").unwrap();
        plan
    }

    #[test]
    fn request_sends_auth_value_and_config() {
        let mut plan = plan();
        plan.set_value(
            &attrs::path("config"),
            Dynamic::Map([("temperature".to_string(), Dynamic::Number(0.5))].into()),
        )
        .unwrap();

        let body = serde_json::to_value(AgentMapping::create_request(&plan).unwrap()).unwrap();
        assert_eq!(body["auth_value"], "tok");
        assert_eq!(body["config"], serde_json::json!({"temperature": 0.5}));
    }

    #[test]
    fn auth_value_is_never_overwritten() {
        let agent: Agent = serde_json::from_value(serde_json::json!({
            "id": "a-1",
            "name": "planner",
            "authType": "bearer",
            "authValue": "masked"
        }))
        .unwrap();

        let mut state = plan();
        let mut writer = StateWriter::new(&mut state);
        AgentMapping::write_state(&agent, &mut writer);

        assert_eq!(attrs::string(&state, "auth_value").as_deref(), Some("tok"));
        assert!(AgentMapping::schema().attribute("auth_value").unwrap().sensitive);
    }

    #[test]
    fn auth_value_needs_auth_type() {
        let mut config = plan();
        assert!(AgentMapping::validate(&config).is_empty());

        config.set_null(&attrs::path("auth_type")).unwrap();
        let diagnostics = AgentMapping::validate(&config);
        assert_eq!(diagnostics[0].summary, "Missing auth_type");
    }
}
