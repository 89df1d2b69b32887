//! LibreOffice document converter.
//!
//! Implements the [`DocumentConverter`] capability as a headless
//! `soffice --convert-to` subprocess, bounded by a timeout. The converter
//! operates on the whole document; any failure here is fatal for the
//! rasterization call that needed it.

use async_trait::async_trait;
use deckhand_core::{ConvertError, DocumentConverter};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Default bound on a whole-document conversion.
pub const DEFAULT_CONVERT_TIMEOUT: Duration = Duration::from_secs(120);

/// Whole-document converter backed by a headless LibreOffice process.
pub struct SofficeConverter {
    binary: PathBuf,
    timeout: Duration,
}

impl SofficeConverter {
    /// Create a converter using `soffice` from `PATH` and the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("soffice"),
            timeout: DEFAULT_CONVERT_TIMEOUT,
        }
    }

    /// Use a specific LibreOffice binary.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Bound conversions by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SofficeConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentConverter for SofficeConverter {
    async fn convert(
        &self,
        src: &Path,
        target_format: &str,
        out_dir: &Path,
    ) -> Result<PathBuf, ConvertError> {
        debug!("Converting {:?} to {} in {:?}", src, target_format, out_dir);

        let mut command = Command::new(&self.binary);
        command
            .arg("--headless")
            .arg("--convert-to")
            .arg(target_format)
            .arg("--outdir")
            .arg(out_dir)
            .arg(src)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ConvertError::Timeout(self.timeout))?
            .map_err(ConvertError::Spawn)?;

        if !output.status.success() {
            return Err(ConvertError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let converted = out_dir
            .join(src.file_stem().unwrap_or_default())
            .with_extension(target_format);
        if !converted.exists() {
            return Err(ConvertError::MissingOutput(converted));
        }

        info!("Converted {:?} -> {:?}", src, converted);
        Ok(converted)
    }
}
