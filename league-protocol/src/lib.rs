pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod ids;
pub mod logging;
pub mod messages;
pub mod persistence;
pub mod retry;
pub mod rpc;
pub mod state_machine;
pub mod time;

pub use envelope::MessageEnvelope;
pub use error::{DomainErrorCode, JsonRpcError, ProtocolError};
pub use ids::{AgentIdentity, Role};
