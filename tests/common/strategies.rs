#![allow(dead_code)]

use proptest::prelude::*;
use serde_json::{json, Value};

/// Strategy for `{ "value": n }` item batches, including empty ones
pub fn value_batch_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(any::<i32>(), 0..64)
        .prop_map(|values| values.into_iter().map(|value| json!({ "value": value })).collect())
}

/// Strategy for transformation result collections
pub fn result_collection_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec("[a-z]{1,8}", 0..32)
        .prop_map(|names| names.into_iter().map(Value::String).collect())
}

/// Strategy for failure messages
pub fn failure_message_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.:-]{1,40}"
}

/// Strategy for valid diagnostic names
pub fn stage_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,23}"
}
