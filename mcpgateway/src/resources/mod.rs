//! Resource implementations

pub mod attrs;
pub mod auth;
pub mod object;
pub mod resource_agent;
pub mod resource_gateway;
pub mod resource_prompt;
pub mod resource_resource;
pub mod resource_server;
pub mod resource_team;
pub mod resource_tool;

pub use object::{ObjectMapping, ObjectResource};
pub use resource_agent::{AgentMapping, AgentResource};
pub use resource_gateway::{GatewayMapping, GatewayResource};
pub use resource_prompt::{PromptMapping, PromptResource};
pub use resource_resource::{ResourceMapping, ResourceResource};
pub use resource_server::{ServerMapping, ServerResource};
pub use resource_team::{TeamMapping, TeamResource};
pub use resource_tool::{ToolMapping, ToolResource};
