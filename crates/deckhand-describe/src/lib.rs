//! # deckhand-describe
//!
//! AI slide description generation for the deckhand pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`GeminiClient`] | [`DescriptionModel`](deckhand_core::DescriptionModel) over the Gemini API, inline or file-upload |
//! | [`Describer`] | Sequential or Semaphore-bounded fan-out with order-preserving results |
//! | [`DescribeOptions`] | Model, resize, upload, pacing, and pool settings |
//!
//! ## Failure model
//!
//! A missing credential is rejected at client construction, before any
//! request. Per-request failures are captured into
//! [`Description::Failed`](deckhand_core::Description) and never abort
//! sibling requests. Failed requests are not retried; the fixed pre-call
//! pacing delay is the only rate-limit mechanism.

pub mod client;
pub mod generator;

pub use client::{GeminiClient, API_KEY_ENV};
pub use generator::{DescribeOptions, Describer, DEFAULT_MAX_CONCURRENT, DEFAULT_MODEL};
