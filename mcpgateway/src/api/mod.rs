pub mod agents;
pub mod client;
pub mod common;
pub mod error;
pub mod gateways;
pub mod health;
pub mod objects;
pub mod prompts;
pub mod resources;
pub mod servers;
pub mod teams;
pub mod tools;

pub use agents::Agent;
pub use client::{Auth, Client, RetryConfig};
pub use common::GatewayApiObject;
pub use error::ApiError;
pub use gateways::Gateway;
pub use health::HealthStatus;
pub use objects::ObjectsApi;
pub use prompts::{Prompt, PromptArgument};
pub use resources::McpResource;
pub use servers::Server;
pub use teams::Team;
pub use tools::Tool;
