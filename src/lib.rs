#![allow(clippy::doc_markdown)] // Allow technical terms like JSON, AsyncRead in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Batch Stage
//!
//! A buffer-then-transform adapter for object pipelines.
//!
//! ## Overview
//!
//! A [`BatchStage`] privately accumulates every item that flows into it. When
//! upstream signals end-of-input it invokes one user-supplied transformation
//! over the whole collection, exactly once, and re-emits whatever the
//! transformation produces: a single item or an ordered collection, returned
//! synchronously or through a future.
//!
//! ## Key Features
//!
//! - **One batch, one call**: a one-way lifecycle guarantees a single invocation
//! - **Sync and deferred transforms**: both shapes fail through one channel,
//!   panics included
//! - **Attributable failures**: every failure message is prefixed with the
//!   stage's diagnostic name
//! - **Content stream gate**: items backed by live streams are refused unless
//!   explicitly enabled
//!
//! ## Module Organization
//!
//! - [`stage`] - The stage state machine and its stream adapter
//! - [`duplex`] - Running a stage as a tokio task with input and output halves
//! - [`transform`] - Transformation trait, result shapes and fn adapters
//! - [`config`] - Stage options and declarative settings
//! - [`item`] - The content stream capability
//! - [`file`] - File-like pipeline items
//! - [`state`] - Lifecycle states and events
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use batch_stage::{transform, BatchStage, Rejection, StageOptions};
//! use futures::{stream, StreamExt};
//! use serde_json::{json, Value};
//!
//! async fn collect_values(items: Vec<Value>) -> Result<Value, Rejection> {
//!     let values: Vec<Value> = items.into_iter().map(|item| item["value"].clone()).collect();
//!     Ok(json!({ "values": values }))
//! }
//!
//! # tokio_test::block_on(async {
//! let stage = BatchStage::new(StageOptions::new(transform::from_async_fn(collect_values)))?;
//! assert_eq!(stage.name(), "collect_values");
//!
//! let input = stream::iter((0..4).map(|value| json!({ "value": value })));
//! let output: Vec<_> = stage.process(input).collect().await;
//! assert_eq!(output.len(), 1);
//! assert_eq!(output[0].as_ref().unwrap(), &json!({ "values": [0, 1, 2, 3] }));
//! # Ok::<(), batch_stage::StageError>(())
//! # }).unwrap();
//! ```

pub mod config;
pub mod duplex;
pub mod error;
pub mod file;
pub mod item;
pub mod logging;
pub mod stage;
pub mod state;
pub mod transform;

pub use config::{StageOptions, StageSettings, DEFAULT_CHANNEL_CAPACITY, DEFAULT_STAGE_NAME};
pub use duplex::{SpawnedStage, StageHandle, StageInput, StageOutput};
pub use error::{BoxError, Rejection, Result, StageError};
pub use file::{Contents, File};
pub use item::ContentStream;
pub use stage::BatchStage;
pub use state::{StageEvent, StageState};
pub use transform::{from_async_fn, from_fn, Batch, Outcome, Transform};
