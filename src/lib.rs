pub mod api;
pub mod events;
pub mod router;
pub mod schema;
pub mod scout;
pub mod session;
pub mod tables;
