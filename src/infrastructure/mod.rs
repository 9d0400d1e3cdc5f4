pub mod config;
pub mod http;
pub mod llm;
pub mod pdf;
pub mod queue;
pub mod repositories;
pub mod transcode;
pub mod tts;
