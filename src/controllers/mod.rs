pub mod generation;
pub mod health;
pub mod points;
pub mod reservations;
