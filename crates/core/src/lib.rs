//! Core business logic for pantry.

pub mod services;
pub mod views;

pub use services::*;
pub use views::*;
