pub mod auth;
pub mod generation;
pub mod points;
