//! # Item Capabilities
//!
//! Items flowing through a stage are opaque. The one capability the stage
//! inspects is whether an item is backed by a live content stream.

use std::sync::Arc;

/// Capability answering whether an item carries an embedded content stream.
///
/// The default answer is "no"; only item types that can hold a live stream
/// override it.
pub trait ContentStream {
    fn is_stream(&self) -> bool {
        false
    }
}

macro_rules! not_stream_backed {
    ($($ty:ty),* $(,)?) => {
        $(impl ContentStream for $ty {})*
    };
}

not_stream_backed!(
    serde_json::Value,
    String,
    &'static str,
    Vec<u8>,
    bool,
    char,
    (),
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
);

impl<T: ContentStream + ?Sized> ContentStream for Box<T> {
    fn is_stream(&self) -> bool {
        (**self).is_stream()
    }
}

impl<T: ContentStream + ?Sized> ContentStream for Arc<T> {
    fn is_stream(&self) -> bool {
        (**self).is_stream()
    }
}

impl<T: ContentStream> ContentStream for Option<T> {
    fn is_stream(&self) -> bool {
        self.as_ref().is_some_and(ContentStream::is_stream)
    }
}
