use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::text::DEFAULT_CHUNK_CHAR_LIMIT;
use crate::domain::tts::{AudioFormat, LanguageCode};

/// Piper timeouts below this are raised to it
const MIN_PIPER_TIMEOUT_SEC: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    pub cors_origins: Vec<String>,
    // Storage
    pub audio_out_dir: PathBuf,
    pub cleaned_dir: PathBuf,
    // Upload
    pub max_upload_bytes: usize,
    pub chunk_char_limit: usize,
    pub pdftotext_path: String,
    pub llm: LlmConfig,
    pub tts: TtsConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Optional language-model cleaning and title extraction
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    pub cleaning_enabled: bool,
    pub title_enabled: bool,
    pub model: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PiperMode {
    Http,
    Cli,
}

#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub provider: String,
    pub provider_order: Vec<String>,
    pub voice: Option<String>,
    pub language_voices: HashMap<LanguageCode, String>,
    /// Speaking rate as a percentage of normal speed
    pub rate: Option<u32>,
    pub format: AudioFormat,
    pub openai_model: Option<String>,
    pub openai_timeout_sec: u64,
    pub keep_intermediate_master: bool,
    pub polly_region: String,
    pub polly_timeout_sec: u64,
    pub piper_mode: PiperMode,
    pub piper_url: String,
    pub piper_timeout_sec: u64,
    pub piper_bin: String,
    pub piper_model_path: Option<PathBuf>,
    pub ffmpeg_path: String,
    pub mp3_bitrate: String,
    pub transcode_sample_rate: u32,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub queue_capacity: usize,
    pub job_time_limit_sec: u64,
    pub status_ttl_hours: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let max_upload_mb: usize = parse_or("MAX_UPLOAD_MB", 20usize)?;

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 8080u16)?,
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "production" => Environment::Production,
                    _ => Environment::Development,
                })?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            cors_origins: split_list(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            ),
            audio_out_dir: env::var("AUDIO_OUT_DIR")
                .unwrap_or_else(|_| "static".to_string())
                .into(),
            cleaned_dir: env::var("CLEANED_DIR")
                .unwrap_or_else(|_| "cleaned".to_string())
                .into(),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            chunk_char_limit: parse_or("CHUNK_CHAR_LIMIT", DEFAULT_CHUNK_CHAR_LIMIT)?.max(1),
            pdftotext_path: env::var("PDFTOTEXT_PATH").unwrap_or_else(|_| "pdftotext".to_string()),
            llm: LlmConfig::from_env()?,
            tts: TtsConfig::from_env()?,
            worker: WorkerConfig::from_env()?,
        };

        Ok(config)
    }
}

impl LlmConfig {
    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            cleaning_enabled: flag("LLM_CLEANING_ENABLED"),
            title_enabled: flag("LLM_TITLE_ENABLED"),
            model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
        })
    }

    /// The LLM collaborator is only built when a feature needs it and a key exists
    pub fn is_active(&self) -> bool {
        self.openai_api_key.is_some() && (self.cleaning_enabled || self.title_enabled)
    }
}

impl TtsConfig {
    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let piper_mode = match env::var("PIPER_MODE")
            .unwrap_or_else(|_| "http".to_string())
            .to_lowercase()
            .as_str()
        {
            "cli" => PiperMode::Cli,
            _ => PiperMode::Http,
        };

        let language_voices = LanguageCode::ALL
            .into_iter()
            .filter_map(|language| {
                let key = format!("TTS_VOICE_{}", language.as_str().to_uppercase());
                non_empty_var(&key).map(|voice| (language, voice))
            })
            .collect();

        Ok(Self {
            provider: env::var("TTS_PROVIDER")
                .unwrap_or_else(|_| "piper".to_string())
                .trim()
                .to_lowercase(),
            provider_order: split_list(&env::var("TTS_PROVIDER_ORDER").unwrap_or_default()),
            voice: non_empty_var("TTS_VOICE"),
            language_voices,
            rate: non_empty_var("TTS_RATE").map(|r| r.parse::<u32>()).transpose()?,
            format: env::var("TTS_FORMAT")
                .unwrap_or_else(|_| "wav".to_string())
                .parse::<AudioFormat>()?,
            openai_model: non_empty_var("TTS_MODEL"),
            openai_timeout_sec: parse_or("OPENAI_TIMEOUT_SEC", 60u64)?,
            keep_intermediate_master: flag("KEEP_INTERMEDIATE_MASTER"),
            polly_region: env::var("POLLY_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .unwrap_or_else(|_| "eu-west-1".to_string()),
            polly_timeout_sec: parse_or("POLLY_TIMEOUT_SEC", 60u64)?,
            piper_mode,
            piper_url: env::var("PIPER_URL").unwrap_or_else(|_| "http://piper:5000".to_string()),
            piper_timeout_sec: parse_or("PIPER_TIMEOUT_SEC", 60u64)?.max(MIN_PIPER_TIMEOUT_SEC),
            piper_bin: env::var("PIPER_BIN").unwrap_or_else(|_| "piper".to_string()),
            piper_model_path: non_empty_var("PIPER_MODEL_PATH").map(PathBuf::from),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            mp3_bitrate: env::var("MP3_BITRATE").unwrap_or_else(|_| "160k".to_string()),
            transcode_sample_rate: parse_or("TRANSCODE_SAMPLE_RATE", 24_000u32)?,
        })
    }
}

impl WorkerConfig {
    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            concurrency: parse_or("WORKER_CONCURRENCY", 2usize)?.max(1),
            queue_capacity: parse_or("QUEUE_CAPACITY", 1024usize)?.max(1),
            job_time_limit_sec: parse_or("JOB_TIME_LIMIT_SEC", 600u64)?,
            status_ttl_hours: parse_or("JOB_STATUS_TTL_HOURS", 24u64)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: Environment::Development,
            log_format: LogFormat::Pretty,
            cors_origins: vec!["http://localhost:3000".to_string()],
            audio_out_dir: "static".into(),
            cleaned_dir: "cleaned".into(),
            max_upload_bytes: 20 * 1024 * 1024,
            chunk_char_limit: DEFAULT_CHUNK_CHAR_LIMIT,
            pdftotext_path: "pdftotext".to_string(),
            llm: LlmConfig {
                openai_api_key: None,
                cleaning_enabled: false,
                title_enabled: false,
                model: "gpt-3.5-turbo".to_string(),
            },
            tts: TtsConfig::default(),
            worker: WorkerConfig {
                concurrency: 2,
                queue_capacity: 1024,
                job_time_limit_sec: 600,
                status_ttl_hours: 24,
            },
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: "piper".to_string(),
            provider_order: Vec::new(),
            voice: None,
            language_voices: HashMap::new(),
            rate: None,
            format: AudioFormat::Wav,
            openai_model: None,
            openai_timeout_sec: 60,
            keep_intermediate_master: false,
            polly_region: "eu-west-1".to_string(),
            polly_timeout_sec: 60,
            piper_mode: PiperMode::Http,
            piper_url: "http://piper:5000".to_string(),
            piper_timeout_sec: 60,
            piper_bin: "piper".to_string(),
            piper_model_path: None,
            ffmpeg_path: "ffmpeg".to_string(),
            mp3_bitrate: "160k".to_string(),
            transcode_sample_rate: 24_000,
        }
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::error::Error + 'static,
{
    match non_empty_var(key) {
        Some(value) => value
            .parse::<T>()
            .map_err(|e| format!("invalid value for {}: {}", key, e).into()),
        None => Ok(default),
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn flag(key: &str) -> bool {
    env::var(key)
        .map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Comma separated list, lowercased, blanks dropped
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}
