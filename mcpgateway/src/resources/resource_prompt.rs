//! `mcpgateway_prompt`

use std::collections::HashMap;
use tfplug::schema::Schema;
use tfplug::{AttributeBuilder, AttributeType, Diagnostic, Dynamic, DynamicValue, SchemaBuilder};

use super::attrs::{self, StateWriter};
use super::object::{ObjectMapping, ObjectResource};
use crate::api::prompts::{Prompt, PromptArgument, PromptRequest};

pub struct PromptMapping;

pub type PromptResource = ObjectResource<PromptMapping>;

fn argument_type() -> AttributeType {
    AttributeType::object([
        ("name", AttributeType::String),
        ("description", AttributeType::String),
        ("required", AttributeType::Bool),
    ])
}

fn read_arguments(plan: &DynamicValue) -> Result<Option<Vec<PromptArgument>>, Diagnostic> {
    let Some(items) = plan.get_list_opt(&attrs::path("arguments")) else {
        return Ok(None);
    };

    let mut arguments = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let fields = item.as_map();
        let field = |name: &str| fields.and_then(|f| f.get(name));
        let name = field("name")
            .and_then(Dynamic::as_string)
            .ok_or_else(|| {
                Diagnostic::error(
                    "Missing argument name",
                    format!("Prompt argument {} has no name", index),
                )
                .with_attribute(attrs::path("arguments").index(index as i64).attribute("name"))
            })?;
        arguments.push(PromptArgument {
            name: name.to_string(),
            description: field("description")
                .and_then(Dynamic::as_string)
                .map(str::to_string),
            required: field("required").and_then(Dynamic::as_bool),
        });
    }
    Ok(Some(arguments))
}

/// Builds the state element for an argument. An element already in state
/// with the same name is kept so unset optional fields stay null.
fn argument_value(argument: &PromptArgument, existing: Option<&Dynamic>) -> Dynamic {
    if let Some(existing) = existing {
        let same_name = existing
            .as_map()
            .and_then(|fields| fields.get("name"))
            .and_then(Dynamic::as_string)
            == Some(argument.name.as_str());
        if same_name {
            return existing.clone();
        }
    }

    let mut fields = HashMap::new();
    fields.insert("name".to_string(), Dynamic::String(argument.name.clone()));
    fields.insert(
        "description".to_string(),
        Dynamic::from(argument.description.clone()),
    );
    fields.insert("required".to_string(), Dynamic::from(argument.required));
    Dynamic::Map(fields)
}

impl PromptMapping {
    fn request(plan: &DynamicValue) -> Result<PromptRequest, Diagnostic> {
        Ok(PromptRequest {
            name: Some(attrs::required_string(plan, "name")?),
            description: attrs::string(plan, "description"),
            template: Some(attrs::required_string(plan, "template")?),
            arguments: read_arguments(plan)?,
            tags: attrs::string_list(plan, "tags"),
            visibility: attrs::string(plan, "visibility"),
            team_id: attrs::string(plan, "team_id"),
        })
    }
}

impl ObjectMapping for PromptMapping {
    type Object = Prompt;

    const TYPE_NAME: &'static str = "mcpgateway_prompt";

    fn schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("A prompt template served by the gateway")
            .attribute(attrs::id_attribute("prompt"))
            .attribute(attrs::name_attribute("prompt"))
            .attribute(attrs::optional_string("description", "Description of the prompt"))
            .attribute(
                AttributeBuilder::new("template", AttributeType::String)
                    .description("Jinja template rendered when the prompt is fetched")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("arguments", AttributeType::list(argument_type()))
                    .description("Arguments accepted by the template")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(attrs::tags_attribute())
            .attribute(attrs::visibility_attribute())
            .attribute(attrs::team_id_attribute())
            .attribute(attrs::owner_email_attribute())
            .attribute(attrs::enabled_attribute())
            .attribute(attrs::created_at_attribute())
            .attribute(attrs::updated_at_attribute())
            .build()
    }

    fn create_request(plan: &DynamicValue) -> Result<PromptRequest, Diagnostic> {
        Self::request(plan)
    }

    fn update_request(plan: &DynamicValue) -> Result<PromptRequest, Diagnostic> {
        Self::request(plan)
    }

    fn write_state(prompt: &Prompt, state: &mut StateWriter<'_>) {
        state
            .string("name", Some(&prompt.name))
            .string("description", prompt.description.as_deref())
            .string("template", prompt.template.as_deref())
            .strings("tags", &prompt.tags)
            .string("visibility", prompt.visibility.as_deref())
            .string("team_id", prompt.team_id.as_deref())
            .string("owner_email", prompt.owner_email.as_deref())
            .bool("enabled", prompt.active.value())
            .string("created_at", prompt.created_at.as_deref())
            .string("updated_at", prompt.updated_at.as_deref());
        if let Some(arguments) = &prompt.arguments {
            let existing = state
                .current("arguments")
                .and_then(Dynamic::as_list)
                .map(<[Dynamic]>::to_vec)
                .unwrap_or_default();
            let list = arguments
                .iter()
                .enumerate()
                .map(|(index, argument)| argument_value(argument, existing.get(index)))
                .collect();
            state.value("arguments", Dynamic::List(list));
        }
    }

    fn enabled(prompt: &Prompt) -> Option<bool> {
        prompt.active.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argument(name: &str, required: Option<bool>) -> Dynamic {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), Dynamic::String(name.to_string()));
        fields.insert("description".to_string(), Dynamic::Null);
        fields.insert("required".to_string(), Dynamic::from(required));
        Dynamic::Map(fields)
    }

    #[test]
    fn arguments_become_request_objects() {
        let mut plan = DynamicValue::object();
        plan.set_string(&attrs::path("name"), "summarize").unwrap();
        plan.set_string(&attrs::path("template"), "Summarize {{ text }}")
            .unwrap();
        plan.set_list(
            &attrs::path("arguments"),
            vec![argument("text", Some(true)), argument("style", None)],
        )
        .unwrap();

        let body = serde_json::to_value(PromptMapping::create_request(&plan).unwrap()).unwrap();
        assert_eq!(
            body["arguments"],
            serde_json::json!([{"name": "text", "required": true}, {"name": "style"}])
        );
    }

    #[test]
    fn argument_without_name_is_rejected() {
        let mut plan = DynamicValue::object();
        plan.set_string(&attrs::path("name"), "summarize").unwrap();
        plan.set_string(&attrs::path("template"), "t").unwrap();
        plan.set_list(&attrs::path("arguments"), vec![Dynamic::Map(HashMap::new())])
            .unwrap();

        let err = PromptMapping::create_request(&plan).unwrap_err();
        assert_eq!(err.summary, "Missing argument name");
    }

    #[test]
    fn write_state_keeps_planned_arguments() {
        let prompt: Prompt = serde_json::from_value(serde_json::json!({
            "id": "p-1",
            "name": "summarize",
            "template": "t",
            "arguments": [
                {"name": "text", "required": false},
                {"name": "style", "description": "Tone of the summary"}
            ]
        }))
        .unwrap();

        let mut state = DynamicValue::object();
        state
            .set_list(&attrs::path("arguments"), vec![argument("text", None)])
            .unwrap();
        let mut writer = StateWriter::new(&mut state);
        PromptMapping::write_state(&prompt, &mut writer);

        let arguments = state.get_list_opt(&attrs::path("arguments")).unwrap();
        assert_eq!(arguments.len(), 2);
        assert_eq!(arguments[0], argument("text", None));
        let added = arguments[1].as_map().unwrap();
        assert_eq!(
            added["description"],
            Dynamic::String("Tone of the summary".to_string())
        );
        assert_eq!(added["required"], Dynamic::Null);
    }
}
