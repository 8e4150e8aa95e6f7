//! Concrete plugin implementations for the autoforge core: the GitHub host
//! client and the agent-service capability clients.

pub mod agents;
pub mod github;
pub mod services;

pub use services::PluginServicesFactory;
