pub mod chat;
pub mod config;
pub mod console;
pub mod doctor;
pub mod envfile;
pub mod error;
pub mod gemini;
pub mod http;
pub mod llm;
pub mod router;
pub mod setup;
