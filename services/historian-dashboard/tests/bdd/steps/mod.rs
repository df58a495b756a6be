//! BDD step definitions for the historian dashboard

pub mod feed_steps;
pub mod lifecycle_steps;
pub mod rendering_steps;
