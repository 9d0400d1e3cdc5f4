use anyhow::{bail, Context};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use uuid::Uuid;

/// Pulls plain text out of PDF bytes
#[async_trait]
pub trait PdfTextExtractor: Send + Sync {
    async fn extract_text(&self, pdf: &[u8]) -> anyhow::Result<String>;
}

/// Extraction through poppler's `pdftotext`
pub struct PdfToTextExtractor {
    bin: String,
    timeout: Duration,
}

impl PdfToTextExtractor {
    pub fn new(bin: String, timeout: Duration) -> Self {
        Self { bin, timeout }
    }
}

#[async_trait]
impl PdfTextExtractor for PdfToTextExtractor {
    async fn extract_text(&self, pdf: &[u8]) -> anyhow::Result<String> {
        if !pdf.starts_with(b"%PDF") {
            bail!("file is not a PDF document");
        }

        let input = std::env::temp_dir().join(format!("narrator-{}.pdf", Uuid::new_v4().simple()));
        tokio::fs::write(&input, pdf)
            .await
            .context("failed to stage PDF for extraction")?;

        let output = Command::new(&self.bin)
            .args(["-enc", "UTF-8"])
            .arg(&input)
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();
        let result = tokio::time::timeout(self.timeout, output).await;
        let _ = tokio::fs::remove_file(&input).await;

        let output = result
            .context("pdftotext timed out")?
            .with_context(|| format!("failed to run {}", self.bin))?;

        if !output.status.success() {
            bail!(
                "pdftotext exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        tracing::debug!(pdf_size = pdf.len(), text_size = output.stdout.len(), "PDF text extracted");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
