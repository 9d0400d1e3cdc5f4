pub mod article;
pub mod text;
pub mod tts;
