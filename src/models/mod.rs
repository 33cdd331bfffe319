pub mod bid;
pub mod location;
pub mod notification;
pub mod order;
pub mod requirement;
pub mod truck;
pub mod user;
