//! Description generation fan-out.
//!
//! Turns a list of (image, prompt) requests into descriptions via the
//! [`DescriptionModel`] capability, under a pacing policy and an optional
//! bounded worker pool. Output is always 1:1 and order-preserving with the
//! input; one request's failure never aborts its siblings.

use deckhand_core::{
    DescribeError, DescribeRequest, Description, DescriptionModel, ImagePayload, ImageSize,
};
use image::imageops::FilterType;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Default generative model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default bound on concurrent in-flight requests.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Options governing a description batch.
#[derive(Debug, Clone)]
pub struct DescribeOptions {
    /// Model identifier passed to the backend
    pub model_name: String,
    /// Stretch images to exactly this size before submission
    pub resize: Option<ImageSize>,
    /// Stage images via the upload surface instead of inline bytes
    pub remote_upload: bool,
    /// Use the bounded worker pool instead of sequential calls
    pub parallel: bool,
    /// Worker pool bound; exists to respect the external rate limit
    pub max_concurrent: usize,
    /// Fixed delay before every outbound call, including the first
    pub pacing: Duration,
}

impl Default for DescribeOptions {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            resize: None,
            remote_upload: false,
            parallel: false,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            pacing: Duration::from_secs(1),
        }
    }
}

/// Generates slide descriptions through a [`DescriptionModel`].
pub struct Describer {
    model: Arc<dyn DescriptionModel>,
    options: DescribeOptions,
}

impl Describer {
    /// Create a describer over the given model capability.
    #[must_use]
    pub fn new(model: Arc<dyn DescriptionModel>, options: DescribeOptions) -> Self {
        Self { model, options }
    }

    /// Describe a single image. Never fails past its own boundary: every
    /// error lands in [`Description::Failed`].
    pub async fn describe_one(&self, request: &DescribeRequest) -> Description {
        describe_single(Arc::clone(&self.model), self.options.clone(), request.clone()).await
    }

    /// Describe a batch of images.
    ///
    /// The output has the same length and order as `requests`, regardless of
    /// execution mode and of which remote call returns first.
    pub async fn describe_many(&self, requests: &[DescribeRequest]) -> Vec<Description> {
        if requests.is_empty() {
            return Vec::new();
        }
        debug!(
            "Describing {} images ({})",
            requests.len(),
            if self.options.parallel {
                "concurrent"
            } else {
                "sequential"
            }
        );

        if self.options.parallel {
            self.describe_concurrent(requests).await
        } else {
            let mut results = Vec::with_capacity(requests.len());
            for request in requests {
                results.push(self.describe_one(request).await);
            }
            results
        }
    }

    async fn describe_concurrent(&self, requests: &[DescribeRequest]) -> Vec<Description> {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent.max(1)));
        let mut tasks = JoinSet::new();

        for (position, request) in requests.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let model = Arc::clone(&self.model);
            let options = self.options.clone();
            let request = request.clone();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (position, Description::Failed("worker pool closed".to_string()));
                };
                (position, describe_single(model, options, request).await)
            });
        }

        // Completion order is not submission order; reassemble by position.
        let mut results: Vec<Option<Description>> = vec![None; requests.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, description)) => results[position] = Some(description),
                Err(e) => warn!("Description task panicked: {e}"),
            }
        }

        results
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Description::Failed("description task failed".to_string())))
            .collect()
    }
}

/// One request against the model, with every failure captured.
async fn describe_single(
    model: Arc<dyn DescriptionModel>,
    options: DescribeOptions,
    request: DescribeRequest,
) -> Description {
    match try_describe(&*model, &options, &request).await {
        Ok(text) => Description::Generated(text),
        Err(e) => {
            warn!("Description of {:?} failed: {}", request.image_path, e);
            Description::Failed(e.to_string())
        }
    }
}

async fn try_describe(
    model: &dyn DescriptionModel,
    options: &DescribeOptions,
    request: &DescribeRequest,
) -> Result<String, DescribeError> {
    let data = tokio::fs::read(&request.image_path)
        .await
        .map_err(|e| DescribeError::Image {
            path: request.image_path.clone(),
            source: e,
        })?;
    let mime_type = mime_guess::from_path(&request.image_path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    let data = match options.resize {
        Some(size) => {
            let format = image::ImageFormat::from_path(&request.image_path)
                .unwrap_or(image::ImageFormat::Png);
            tokio::task::spawn_blocking(move || resize_for_submission(data, format, size))
                .await
                .map_err(|e| DescribeError::Process(format!("resize task failed: {e}")))??
        }
        None => data,
    };

    let payload = if options.remote_upload {
        let uri = model.stage(data, &mime_type).await?;
        ImagePayload::Handle { uri, mime_type }
    } else {
        ImagePayload::Inline { data, mime_type }
    };

    // Fixed pre-call pacing, applied even on the first call in a batch.
    tokio::time::sleep(options.pacing).await;

    model
        .generate(&payload, &request.prompt, &options.model_name)
        .await
}

fn resize_for_submission(
    data: Vec<u8>,
    format: image::ImageFormat,
    size: ImageSize,
) -> Result<Vec<u8>, DescribeError> {
    let decoded =
        image::load_from_memory(&data).map_err(|e| DescribeError::Process(e.to_string()))?;
    let resized = decoded.resize_exact(size.width, size.height, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, format)
        .map_err(|e| DescribeError::Process(e.to_string()))?;
    Ok(out.into_inner())
}
