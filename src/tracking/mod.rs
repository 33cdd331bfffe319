pub mod hub;
pub mod messages;
