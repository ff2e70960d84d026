// Temporal layout and interaction engine for calendar grids
// Exports all modules for hosts and tests

pub mod models;
pub mod services;
pub mod utils;
