pub mod credentials;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod prompt_template;
pub mod providers;
pub mod rag;
pub mod search;
pub mod session;
pub mod tools;
