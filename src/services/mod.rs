pub mod analysis;
pub mod auth;
pub mod notify;
pub mod push;
pub mod queue;
pub mod sweeper;
