pub mod agents;
pub mod config;
pub mod console;
pub mod gateway;
pub mod media;
pub mod orchestrator;
pub mod prompts;
pub mod runner;
pub mod store;
pub mod transcribe;
pub mod types;
