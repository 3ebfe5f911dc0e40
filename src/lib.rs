pub mod storage;
pub mod sql;
pub mod catalog;
pub mod execution;
pub mod index;
pub mod error;
pub mod planner;
pub mod engine;
