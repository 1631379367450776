//! # Batch Transformations
//!
//! A transformation receives the whole buffered batch once and answers with
//! either a single item or an ordered collection, synchronously or through a
//! deferred future. Both shapes fail through the same [`Rejection`] channel.
//!
//! ```rust
//! use batch_stage::transform::{self, Transform};
//! use batch_stage::Rejection;
//!
//! fn evens(items: Vec<u32>) -> Result<Vec<u32>, Rejection> {
//!     Ok(items.into_iter().filter(|n| n % 2 == 0).collect())
//! }
//!
//! let transform = transform::from_fn(evens);
//! assert_eq!(Transform::<u32>::name(&transform), Some("evens"));
//! ```

use crate::error::Rejection;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;

/// Result shape of a transformation
#[derive(Debug, Clone, PartialEq)]
pub enum Batch<T> {
    /// Emitted downstream as exactly one item
    Single(T),
    /// Each element is emitted individually, in order
    Many(Vec<T>),
}

impl<T> Batch<T> {
    /// Number of items this batch emits
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into the items to emit, preserving order
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Single(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

impl<T> From<T> for Batch<T> {
    fn from(item: T) -> Self {
        Self::Single(item)
    }
}

impl<T> From<Vec<T>> for Batch<T> {
    fn from(items: Vec<T>) -> Self {
        Self::Many(items)
    }
}

impl<T> IntoIterator for Batch<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_items().into_iter()
    }
}

/// What a transformation hands back when invoked
pub enum Outcome<T> {
    /// Settled synchronously
    Ready(Result<Batch<T>, Rejection>),
    /// Settles later
    Deferred(BoxFuture<'static, Result<Batch<T>, Rejection>>),
}

impl<T> Outcome<T> {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

/// A user-supplied batch transformation
pub trait Transform<T>: Send + Sync {
    /// Invoke the transformation over the full batch
    fn call(&self, items: Vec<T>) -> Outcome<T>;

    /// The transformation's own declared name, used for diagnostics
    fn name(&self) -> Option<&str> {
        None
    }
}

/// Adapter for synchronous functions, see [`from_fn`]
pub struct FnTransform<F> {
    f: F,
    name: Option<String>,
}

/// Adapter for functions returning futures, see [`from_async_fn`]
pub struct AsyncFnTransform<F> {
    f: F,
    name: Option<String>,
}

/// Wrap a synchronous function.
///
/// Fn items keep their own name for diagnostics; closures are anonymous.
pub fn from_fn<F>(f: F) -> FnTransform<F> {
    FnTransform {
        name: declared_name::<F>().map(str::to_string),
        f,
    }
}

/// Wrap a function that returns a future
pub fn from_async_fn<F>(f: F) -> AsyncFnTransform<F> {
    AsyncFnTransform {
        name: declared_name::<F>().map(str::to_string),
        f,
    }
}

impl<F> FnTransform<F> {
    /// Override the declared name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<F> AsyncFnTransform<F> {
    /// Override the declared name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl<T, F, B> Transform<T> for FnTransform<F>
where
    F: Fn(Vec<T>) -> Result<B, Rejection> + Send + Sync,
    B: Into<Batch<T>>,
{
    fn call(&self, items: Vec<T>) -> Outcome<T> {
        Outcome::Ready((self.f)(items).map(Into::into))
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl<T, F, Fut, B> Transform<T> for AsyncFnTransform<F>
where
    F: Fn(Vec<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<B, Rejection>> + Send + 'static,
    B: Into<Batch<T>> + 'static,
    T: 'static,
{
    fn call(&self, items: Vec<T>) -> Outcome<T> {
        Outcome::Deferred((self.f)(items).map(|result| result.map(Into::into)).boxed())
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Name of a fn item, taken from its type name.
///
/// Closures, fn pointers and anything that is not a plain snake_case path
/// segment count as anonymous. Best-effort: the format of
/// `std::any::type_name` is not guaranteed, so use `.named(..)` on the
/// adapter when the name must be stable.
pub(crate) fn declared_name<F>() -> Option<&'static str> {
    let full = std::any::type_name::<F>();
    let path = full.split('<').next().unwrap_or(full);
    if path.contains('(') || path.contains(' ') {
        return None;
    }
    let segment = path.rsplit("::").next().unwrap_or(path);
    let mut chars = segment.chars();
    let starts_lower = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let identifier = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    (starts_lower && identifier).then_some(segment)
}
