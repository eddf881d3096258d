pub mod authoring;
pub mod config;
pub mod failure;
pub mod runner;
