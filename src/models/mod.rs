// Module exports for models

pub mod cell;
pub mod config;
pub mod grid_item;
pub mod occurrence;
pub mod selection;
