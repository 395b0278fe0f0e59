pub mod container;
pub mod messages;
pub mod resolve;
pub mod schema;
pub mod session;
pub mod triggers;
