//! Poppler page renderer.
//!
//! Implements the [`PageRenderer`] capability as a per-page `pdftoppm`
//! subprocess. With no output-file argument, pdftoppm writes the rendered
//! page to stdout, which keeps the process stateless.

use async_trait::async_trait;
use deckhand_core::{ImageFormat, PageRenderer, RenderError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Default render resolution in DPI.
pub const DEFAULT_RENDER_DPI: u32 = 150;

/// PDF page renderer backed by poppler's `pdftoppm`.
pub struct PdftoppmRenderer {
    binary: PathBuf,
    dpi: u32,
}

impl PdftoppmRenderer {
    /// Create a renderer using `pdftoppm` from `PATH` at the default DPI.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("pdftoppm"),
            dpi: DEFAULT_RENDER_DPI,
        }
    }

    /// Use a specific pdftoppm binary.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Render at `dpi` instead of the default.
    #[must_use]
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageRenderer for PdftoppmRenderer {
    async fn render_page(
        &self,
        doc: &Path,
        page: u32,
        format: ImageFormat,
    ) -> Result<Vec<u8>, RenderError> {
        debug!("Rendering page {} of {:?} at {} dpi", page, doc, self.dpi);

        let format_flag = match format {
            ImageFormat::Png => "-png",
            ImageFormat::Jpeg => "-jpeg",
        };

        let output = Command::new(&self.binary)
            .arg(format_flag)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg(doc)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(RenderError::Spawn)?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                page,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.is_empty() {
            // pdftoppm exits 0 for an out-of-range page but renders nothing
            return Err(RenderError::Failed {
                page,
                reason: "renderer produced no output".to_string(),
            });
        }

        Ok(output.stdout)
    }
}
