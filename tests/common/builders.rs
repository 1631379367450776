//! Test data builders and recording transforms shared by integration tests

#![allow(dead_code)]

use batch_stage::{File, Rejection};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// `{ "value": n }` items for each n in the range
pub fn value_items(range: std::ops::Range<i64>) -> Vec<Value> {
    range.map(|value| json!({ "value": value })).collect()
}

/// Builder for file items
pub struct FileBuilder {
    path: String,
    base: Option<String>,
    contents: FileContents,
}

enum FileContents {
    Null,
    Buffer(Vec<u8>),
    Stream(Vec<u8>),
}

impl FileBuilder {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            base: None,
            contents: FileContents::Null,
        }
    }

    pub fn with_base(mut self, base: &str) -> Self {
        self.base = Some(base.to_string());
        self
    }

    pub fn buffered(mut self, bytes: &[u8]) -> Self {
        self.contents = FileContents::Buffer(bytes.to_vec());
        self
    }

    pub fn streamed(mut self, bytes: &[u8]) -> Self {
        self.contents = FileContents::Stream(bytes.to_vec());
        self
    }

    pub fn build(self) -> File {
        let file = match self.contents {
            FileContents::Null => File::new(self.path),
            FileContents::Buffer(bytes) => File::buffered(self.path, bytes),
            FileContents::Stream(bytes) => File::streamed(self.path, std::io::Cursor::new(bytes)),
        };
        match self.base {
            Some(base) => file.with_base(base),
            None => file,
        }
    }
}

/// Records every batch a transform is invoked with
#[derive(Clone, Default)]
pub struct CallRecorder<T> {
    calls: Arc<Mutex<Vec<Vec<T>>>>,
}

impl<T: Clone> CallRecorder<T> {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn record(&self, items: &[T]) {
        self.calls.lock().unwrap().push(items.to_vec());
    }

    pub fn calls(&self) -> Vec<Vec<T>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// Transform body that always fails with a structured error
pub fn failing(message: &str) -> Rejection {
    Rejection::msg(message)
}
