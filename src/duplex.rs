//! # Spawned Duplex Stage
//!
//! Runs a [`BatchStage`] as a tokio task with an input half, an output half
//! and a join handle. The bounded input channel is the per-item acceptance
//! primitive; dropping (or [`StageInput::end`]-ing) every input half signals
//! end-of-input.
//!
//! The output half doubles as the failure channel. If nobody holds it when
//! the stage fails, the failure is logged and returned from
//! [`StageHandle::join`] instead.

use crate::error::{Result, StageError};
use crate::item::ContentStream;
use crate::stage::BatchStage;
use crate::state::StageState;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Sending half of a spawned stage
#[derive(Debug)]
pub struct StageInput<T> {
    name: String,
    sender: mpsc::Sender<T>,
}

impl<T> Clone for StageInput<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            sender: self.sender.clone(),
        }
    }
}

impl<T> StageInput<T> {
    /// Hand one item to the stage, waiting for channel capacity if needed
    pub async fn send(&self, item: T) -> Result<()> {
        self.sender.send(item).await.map_err(|_| StageError::Closed {
            name: self.name.clone(),
        })
    }

    /// Signal end-of-input from this half
    pub fn end(self) {
        drop(self);
    }

    /// True once the stage stopped accepting items
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Receiving half of a spawned stage: emitted items and the failure channel
#[derive(Debug)]
pub struct StageOutput<T> {
    receiver: mpsc::UnboundedReceiver<Result<T>>,
}

impl<T: Send + 'static> StageOutput<T> {
    /// Next emitted item, a failure, or `None` once the stage has finished
    pub async fn recv(&mut self) -> Option<Result<T>> {
        self.receiver.recv().await
    }

    /// Collect every emitted item, stopping at the first failure
    pub async fn collect(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(next) = self.receiver.recv().await {
            items.push(next?);
        }
        Ok(items)
    }

    pub fn into_stream(self) -> BoxStream<'static, Result<T>> {
        stream::unfold(self.receiver, |mut receiver| async move {
            receiver.recv().await.map(|next| (next, receiver))
        })
        .boxed()
    }
}

/// Join handle of a spawned stage
#[derive(Debug)]
pub struct StageHandle {
    name: String,
    task: JoinHandle<Result<StageState>>,
}

impl StageHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the stage to terminate.
    ///
    /// Returns the terminal state, or the failure itself when it could not be
    /// delivered to an output half.
    pub async fn join(self) -> Result<StageState> {
        match self.task.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => {
                std::panic::resume_unwind(join_error.into_panic())
            }
            Err(_) => Err(StageError::Closed { name: self.name }),
        }
    }
}

/// The three halves of a spawned stage
#[derive(Debug)]
pub struct SpawnedStage<T> {
    pub input: StageInput<T>,
    pub output: StageOutput<T>,
    pub handle: StageHandle,
}

impl<T> BatchStage<T>
where
    T: ContentStream + Send + 'static,
{
    /// Run the stage on the current tokio runtime
    pub fn spawn(self) -> SpawnedStage<T> {
        let name = self.name().to_string();
        let (input_tx, input_rx) = mpsc::channel(self.channel_capacity);
        let (output_tx, output_rx) = mpsc::unbounded_channel();

        debug!(stage = %name, capacity = self.channel_capacity, "Spawning batch stage");
        let task = tokio::spawn(drive(self, input_rx, output_tx));

        SpawnedStage {
            input: StageInput {
                name: name.clone(),
                sender: input_tx,
            },
            output: StageOutput {
                receiver: output_rx,
            },
            handle: StageHandle { name, task },
        }
    }
}

async fn drive<T>(
    mut stage: BatchStage<T>,
    mut input: mpsc::Receiver<T>,
    output: mpsc::UnboundedSender<Result<T>>,
) -> Result<StageState>
where
    T: ContentStream + Send + 'static,
{
    let settled = async {
        while let Some(item) = input.recv().await {
            stage.accept(item)?;
        }
        stage.finish().await
    }
    .await;

    match settled {
        Ok(batch) => {
            for item in batch {
                if output.send(Ok(item)).is_err() {
                    debug!(stage = %stage.name(), "Output dropped, discarding remaining items");
                    break;
                }
            }
            Ok(stage.state())
        }
        Err(failure) => {
            input.close();
            if let Err(mpsc::error::SendError(Err(failure))) = output.send(Err(failure)) {
                error!(
                    stage = %stage.name(),
                    error = %failure,
                    "Unhandled batch stage failure: no output listener"
                );
                return Err(failure);
            }
            Ok(stage.state())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageOptions;
    use crate::error::Rejection;
    use crate::transform::from_fn;
    use serde_json::{json, Value};

    fn sum(items: Vec<Value>) -> std::result::Result<Value, Rejection> {
        let total: i64 = items.iter().filter_map(|item| item["value"].as_i64()).sum();
        Ok(json!({ "total": total }))
    }

    #[tokio::test]
    async fn test_spawned_stage_round_trip() {
        let SpawnedStage {
            input,
            output,
            handle,
        } = BatchStage::new(from_fn(sum)).unwrap().spawn();

        for value in 1..=4 {
            input.send(json!({ "value": value })).await.unwrap();
        }
        input.end();

        assert_eq!(output.collect().await.unwrap(), vec![json!({ "total": 10 })]);
        assert_eq!(handle.join().await.unwrap(), StageState::Completed);
    }

    #[tokio::test]
    async fn test_failure_reaches_output_listener() {
        let options = StageOptions::new(from_fn(|_: Vec<Value>| {
            Err::<Value, _>(Rejection::value("nope"))
        }))
        .with_name("listener");
        let SpawnedStage {
            input,
            mut output,
            handle,
        } = BatchStage::new(options).unwrap().spawn();

        input.send(json!(1)).await.unwrap();
        input.end();

        let failure = output.recv().await.unwrap().unwrap_err();
        assert_eq!(failure.to_string(), "listener: nope");
        assert!(output.recv().await.is_none());
        assert_eq!(handle.join().await.unwrap(), StageState::Failed);
    }

    #[tokio::test]
    async fn test_unhandled_failure_surfaces_from_join() {
        let options = StageOptions::new(from_fn(|_: Vec<Value>| {
            Err::<Value, _>(Rejection::msg("nobody listening"))
        }))
        .with_name("orphaned");
        let SpawnedStage {
            input,
            output,
            handle,
        } = BatchStage::new(options).unwrap().spawn();
        drop(output);
        input.end();

        let failure = handle.join().await.unwrap_err();
        assert_eq!(failure.to_string(), "orphaned: nobody listening");
    }

    #[tokio::test]
    async fn test_input_closed_after_rejection() {
        let options = StageOptions::new(from_fn(|items: Vec<crate::file::File>| {
            Ok::<_, Rejection>(items)
        }))
        .with_name("gate")
        .with_channel_capacity(1);
        let SpawnedStage {
            input,
            mut output,
            handle,
        } = BatchStage::new(options).unwrap().spawn();

        input
            .send(crate::file::File::streamed("live.txt", &b"data"[..]))
            .await
            .unwrap();

        let failure = output.recv().await.unwrap().unwrap_err();
        assert_eq!(failure.to_string(), "gate: content streams are not enabled");

        let refused = input.send(crate::file::File::new("late.txt")).await;
        assert!(matches!(refused, Err(StageError::Closed { .. })));
        assert!(input.is_closed());
        assert_eq!(handle.join().await.unwrap(), StageState::Failed);
    }

    #[tokio::test]
    async fn test_output_as_stream() {
        let SpawnedStage {
            input,
            output,
            handle,
        } = BatchStage::new(from_fn(|items: Vec<Value>| Ok::<_, Rejection>(items)))
            .unwrap()
            .spawn();

        let producer = tokio::spawn(async move {
            for value in 0..3 {
                input.send(json!(value)).await.unwrap();
            }
        });

        let emitted: Vec<Value> = output.into_stream().map(|item| item.unwrap()).collect().await;
        producer.await.unwrap();
        assert_eq!(emitted, vec![json!(0), json!(1), json!(2)]);
        assert_eq!(handle.join().await.unwrap(), StageState::Completed);
    }
}
