// Service module exports

pub mod chain;
pub mod coords;
pub mod engine;
pub mod interaction;
pub mod month;
pub mod now_indicator;
pub mod placement;
pub mod scheduler;
pub mod storage;
