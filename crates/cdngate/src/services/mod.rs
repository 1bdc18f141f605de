//! Gateway, container session and blob implementation

mod blob;
mod config;
mod content_type;
mod gateway;
mod session;

pub use blob::{Blob, FetchOutcome};
pub use config::{
    CascadePolicy, FetchErrorPolicy, GatewayConfig, GatewayInputConfig, DEFAULT_TTL,
    DELETE_CONFIRMATION,
};
pub use content_type::guess_content_type;
pub use gateway::Gateway;
pub use session::{ContainerRef, ContainerSession, GatewayInfo};
