use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::domain::tts::{AudioFormat, TranscodeError};

/// Converts an intermediate WAV master into a delivery format
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        format: AudioFormat,
    ) -> Result<(), TranscodeError>;
}

pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    mp3_bitrate: String,
    sample_rate: u32,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: String, mp3_bitrate: String, sample_rate: u32, timeout: Duration) -> Self {
        Self {
            ffmpeg_path,
            mp3_bitrate,
            sample_rate,
            timeout,
        }
    }

    fn args(&self, input: &Path, output: &Path, format: AudioFormat) -> Result<Vec<String>, TranscodeError> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            input.display().to_string(),
            "-ac".to_string(),
            "1".to_string(),
            "-ar".to_string(),
            self.sample_rate.to_string(),
        ];

        match format {
            AudioFormat::Mp3 => {
                args.extend(["-codec:a", "libmp3lame", "-b:a"].map(String::from));
                args.push(self.mp3_bitrate.clone());
            }
            AudioFormat::Ogg => {
                args.extend(["-codec:a", "libvorbis"].map(String::from));
            }
            AudioFormat::Wav => return Err(TranscodeError::Unsupported(format)),
        }

        args.push(output.display().to_string());
        Ok(args)
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        format: AudioFormat,
    ) -> Result<(), TranscodeError> {
        let args = self.args(input, output, format)?;
        let start_time = std::time::Instant::now();

        let child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TranscodeError::Spawn(format!("{}: {}", self.ffmpeg_path, e)))?;

        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| TranscodeError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| TranscodeError::Spawn(e.to_string()))?;

        if !result.status.success() {
            return Err(TranscodeError::Failed {
                status: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let size = tokio::fs::metadata(output).await.map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(TranscodeError::EmptyOutput);
        }

        tracing::debug!(
            format = %format,
            output_size = size,
            latency_ms = start_time.elapsed().as_millis(),
            "Transcode completed"
        );
        Ok(())
    }
}
