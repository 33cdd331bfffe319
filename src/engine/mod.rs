pub mod lifecycle;
pub mod resolution;
