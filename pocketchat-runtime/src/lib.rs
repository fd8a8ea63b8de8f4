pub mod defaults;
pub mod files;
pub mod llm;
pub mod runtime_engine;
pub mod secrets;
pub mod settings_store;
pub mod transcript;
