pub mod agent;
pub mod errors;
pub mod events;
pub mod ids;
pub mod policy;

pub use agent::{Agent, AgentStream};
pub use errors::AgentError;
pub use events::GenerationEvent;
pub use ids::SessionId;
pub use policy::RestartRollback;
