//! # Batch-Transform Stage
//!
//! Buffers every item flowing through a pipeline stage. When upstream signals
//! end-of-input the stage invokes its transformation exactly once over the
//! whole buffer and re-emits whatever comes back.
//!
//! ## Lifecycle
//!
//! `accepting` → `transforming` → `completed` | `failed`
//!
//! A stream-backed item arriving while content streams are disabled moves the
//! stage straight from `accepting` to `failed`. There are no transitions back,
//! which is what guarantees the transformation runs at most once.
//!
//! ## Example
//!
//! ```rust
//! use batch_stage::{transform, BatchStage, Rejection};
//! use futures::{stream, StreamExt};
//!
//! # tokio_test::block_on(async {
//! let stage = BatchStage::new(transform::from_fn(|items: Vec<u32>| {
//!     Ok::<_, Rejection>(items.into_iter().filter(|n| n % 2 == 0).collect::<Vec<_>>())
//! }))
//! .unwrap();
//!
//! let output: Vec<u32> = stage
//!     .process(stream::iter(1..=5))
//!     .map(Result::unwrap)
//!     .collect()
//!     .await;
//! assert_eq!(output, vec![2, 4]);
//! # });
//! ```

use crate::config::StageOptions;
use crate::error::{Rejection, Result, StageError};
use crate::item::ContentStream;
use crate::logging::log_stage_transition;
use crate::state::{StageEvent, StageState};
use crate::transform::{Batch, Outcome, Transform};
use futures::stream::{self, BoxStream};
use futures::{future, FutureExt, Stream, StreamExt};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, trace};

/// A single-use buffer-then-transform pipeline stage
pub struct BatchStage<T> {
    name: String,
    transform: Arc<dyn Transform<T>>,
    allow_streams: bool,
    pub(crate) channel_capacity: usize,
    buffer: Vec<T>,
    state: StageState,
}

impl<T> BatchStage<T>
where
    T: ContentStream + Send + 'static,
{
    /// Create a stage from a bare transformation or from [`StageOptions`].
    ///
    /// Fails synchronously with [`StageError::MissingCallback`] when the
    /// options carry no transformation.
    pub fn new(options: impl Into<StageOptions<T>>) -> Result<Self> {
        let options = options.into();
        let name = options.diagnostic_name();
        let transform = options.callback.ok_or(StageError::MissingCallback)?;
        options.settings.validate()?;

        debug!(
            stage = %name,
            allow_streams = options.settings.stream,
            "Batch stage created"
        );

        Ok(Self {
            name,
            transform,
            allow_streams: options.settings.stream,
            channel_capacity: options.settings.channel_capacity,
            buffer: Vec::new(),
            state: StageState::Accepting,
        })
    }

    /// Diagnostic name prefixed to every failure message
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn allows_content_streams(&self) -> bool {
        self.allow_streams
    }

    /// Number of items currently held in the pending buffer
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Accept one upstream item.
    ///
    /// A stream-backed item is refused unless content streams are enabled; the
    /// refusal fails the stage and drops everything buffered so far.
    pub fn accept(&mut self, item: T) -> Result<()> {
        if item.is_stream() && !self.allow_streams {
            self.transition(StageEvent::Reject)?;
            self.buffer = Vec::new();
            let error = StageError::StreamsNotEnabled {
                name: self.name.clone(),
            };
            error!(stage = %self.name, error = %error, "Rejected stream-backed item");
            return Err(error);
        }

        self.transition(StageEvent::Accept)?;
        self.buffer.push(item);
        trace!(stage = %self.name, buffered = self.buffer.len(), "Item buffered");
        Ok(())
    }

    /// Signal end-of-input and run the transformation over the whole buffer.
    ///
    /// Synchronous failures, deferred failures and panics on either path are
    /// all reported as [`StageError::Transform`]. The error is handed back one
    /// scheduler tick after it was caught.
    pub async fn finish(&mut self) -> Result<Batch<T>> {
        self.transition(StageEvent::EndOfInput)?;

        let items = std::mem::take(&mut self.buffer);
        debug!(stage = %self.name, items = items.len(), "Invoking batch transform");

        match invoke(Arc::clone(&self.transform), items).await {
            Ok(batch) => {
                self.transition(StageEvent::Resolve)?;
                info!(stage = %self.name, emitted = batch.len(), "Batch transform completed");
                Ok(batch)
            }
            Err(rejection) => {
                let error = StageError::from_rejection(&self.name, rejection);
                self.transition(StageEvent::Fail)?;
                tokio::task::yield_now().await;
                error!(stage = %self.name, error = %error, "Batch transform failed");
                Err(error)
            }
        }
    }

    /// Drive the stage from an upstream stream.
    ///
    /// The returned stream yields each emitted item, or exactly one error if
    /// the stage fails. Upstream is not polled again after a failure.
    pub fn process<S>(mut self, input: S) -> BoxStream<'static, Result<T>>
    where
        S: Stream<Item = T> + Send + 'static,
    {
        async move {
            futures::pin_mut!(input);
            while let Some(item) = input.next().await {
                self.accept(item)?;
            }
            self.finish().await
        }
        .into_stream()
        .flat_map(|settled| match settled {
            Ok(batch) => stream::iter(batch.into_iter().map(Ok)).left_stream(),
            Err(error) => stream::once(future::ready(Err(error))).right_stream(),
        })
        .boxed()
    }

    fn transition(&mut self, event: StageEvent) -> Result<StageState> {
        let from = self.state;
        let to = event
            .target_state(from)
            .ok_or_else(|| StageError::InvalidTransition {
                name: self.name.clone(),
                from: from.to_string(),
                event: event.to_string(),
            })?;

        if from != to {
            log_stage_transition(&self.name, from, to, event);
        }
        self.state = to;
        Ok(to)
    }
}

impl<T> fmt::Debug for BatchStage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchStage")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("allow_streams", &self.allow_streams)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

// Folds the synchronous and deferred failure paths into one result.
async fn invoke<T: Send + 'static>(
    transform: Arc<dyn Transform<T>>,
    items: Vec<T>,
) -> std::result::Result<Batch<T>, Rejection> {
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| transform.call(items))) {
        Ok(outcome) => outcome,
        Err(payload) => return Err(Rejection::from_panic(payload)),
    };

    match outcome {
        Outcome::Ready(result) => result,
        Outcome::Deferred(deferred) => AssertUnwindSafe(deferred)
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(Rejection::from_panic(payload))),
    }
}
