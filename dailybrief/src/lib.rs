// Library interface for dailybrief modules
// This allows tests and other binaries to import modules

pub mod llm;
pub mod messaging;
pub mod pipeline;
pub mod query;
pub mod search;
pub mod settings;
