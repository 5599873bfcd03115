use crate::shape::{CallShape, Continuation};

/// Errors raised by the dispatch engine itself.
///
/// Failures of interceptors or of the implementation are never wrapped in
/// this type; they travel through the return slot or unwind unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The wrong continuation was called for the context's shape, e.g.
    /// `proceed` on an `AsyncFunction` context.
    #[error("{attempted} is not supported for {shape} methods")]
    UnsupportedContinuation {
        shape: CallShape,
        attempted: Continuation,
    },
}
