//! `mcpgateway_team`
//!
//! Teams cannot be toggled; `enabled` only reports the gateway's flag.

use tfplug::schema::Schema;
use tfplug::validator::NumberRangeValidator;
use tfplug::{AttributeBuilder, AttributeType, Diagnostic, DynamicValue, SchemaBuilder};

use super::attrs::{self, StateWriter};
use super::object::{ObjectMapping, ObjectResource};
use crate::api::teams::{Team, TeamRequest};

pub struct TeamMapping;

pub type TeamResource = ObjectResource<TeamMapping>;

impl TeamMapping {
    fn request(plan: &DynamicValue) -> Result<TeamRequest, Diagnostic> {
        Ok(TeamRequest {
            name: Some(attrs::required_string(plan, "name")?),
            slug: attrs::string(plan, "slug"),
            description: attrs::string(plan, "description"),
            visibility: attrs::string(plan, "visibility"),
            max_members: attrs::count(plan, "max_members"),
        })
    }
}

impl ObjectMapping for TeamMapping {
    type Object = Team;

    const TYPE_NAME: &'static str = "mcpgateway_team";

    fn schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("A team grouping users and the objects they share")
            .attribute(attrs::id_attribute("team"))
            .attribute(attrs::name_attribute("team"))
            .attribute(attrs::optional_string(
                "slug",
                "URL-safe name; derived from name when unset",
            ))
            .attribute(attrs::optional_string("description", "Description of the team"))
            .attribute(attrs::one_of(
                "visibility",
                "Who can discover the team: private or public",
                &["private", "public"],
                "private",
            ))
            .attribute(
                AttributeBuilder::new("max_members", AttributeType::Number)
                    .description("Upper bound on team membership")
                    .optional()
                    .computed()
                    .validator(NumberRangeValidator::at_least(1.0))
                    .build(),
            )
            .attribute(attrs::computed(
                "is_personal",
                AttributeType::Bool,
                "Whether this is a user's personal team",
            ))
            .attribute(attrs::computed(
                "created_by",
                AttributeType::String,
                "Email of the user who created the team",
            ))
            .attribute(attrs::computed(
                "member_count",
                AttributeType::Number,
                "Current number of members",
            ))
            .attribute(attrs::computed(
                "enabled",
                AttributeType::Bool,
                "Whether the team is active",
            ))
            .attribute(attrs::created_at_attribute())
            .attribute(attrs::updated_at_attribute())
            .build()
    }

    fn create_request(plan: &DynamicValue) -> Result<TeamRequest, Diagnostic> {
        Self::request(plan)
    }

    fn update_request(plan: &DynamicValue) -> Result<TeamRequest, Diagnostic> {
        Self::request(plan)
    }

    fn write_state(team: &Team, state: &mut StateWriter<'_>) {
        state
            .string("name", Some(&team.name))
            .string("slug", team.slug.as_deref())
            .string("description", team.description.as_deref())
            .string("visibility", team.visibility.as_deref())
            .count("max_members", team.max_members)
            .bool("is_personal", team.is_personal)
            .string("created_by", team.created_by.as_deref())
            .count("member_count", team.member_count)
            .bool("enabled", team.active.value())
            .string("created_at", team.created_at.as_deref())
            .string("updated_at", team.updated_at.as_deref());
    }

    fn enabled(team: &Team) -> Option<bool> {
        team.active.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_is_read_only() {
        let schema = TeamMapping::schema();
        let enabled = schema.attribute("enabled").unwrap();
        assert!(enabled.computed && !enabled.optional);
        assert!(enabled.default.is_none());
        assert_eq!(
            schema.attribute("visibility").unwrap().validators.len(),
            1
        );
    }

    #[test]
    fn request_sends_max_members_as_integer() {
        let mut plan = DynamicValue::object();
        plan.set_string(&attrs::path("name"), "platform").unwrap();
        plan.set_number(&attrs::path("max_members"), 25.0).unwrap();
        plan.mark_unknown(&attrs::path("slug")).unwrap();

        let body = serde_json::to_value(TeamMapping::create_request(&plan).unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"name": "platform", "max_members": 25}));
    }

    #[test]
    fn write_state_reports_membership() {
        let team: Team = serde_json::from_value(serde_json::json!({
            "id": 3,
            "name": "platform",
            "slug": "platform",
            "isPersonal": false,
            "memberCount": 4,
            "is_active": true
        }))
        .unwrap();

        let mut state = DynamicValue::object();
        let mut writer = StateWriter::new(&mut state);
        TeamMapping::write_state(&team, &mut writer);

        assert_eq!(attrs::count(&state, "member_count"), Some(4));
        assert_eq!(attrs::bool(&state, "is_personal"), Some(false));
        assert_eq!(attrs::bool(&state, "enabled"), Some(true));
    }
}
