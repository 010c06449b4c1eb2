pub mod config;
pub mod events;
pub mod sphere;
pub mod sys;
