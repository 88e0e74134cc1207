//! Decides when in-progress generation output is republished.
//!
//! Updates are keyed off how much text has arrived, not wall-clock time, so a
//! slow model does not produce a stream of identical edits and a fast one does
//! not flood the chat.

/// Predicate deciding whether accumulated output should be re-rendered.
pub trait RenderThrottle: Send + Sync {
    /// `rendered` is the length (in chars) at the last render, `accumulated` the current length.
    fn should_render(&self, rendered: usize, accumulated: usize) -> bool;
}

/// Re-render each time at least `n` new characters have arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCadence(pub usize);

impl RenderThrottle for CharCadence {
    fn should_render(&self, rendered: usize, accumulated: usize) -> bool {
        accumulated.saturating_sub(rendered) >= self.0.max(1)
    }
}

impl<F> RenderThrottle for F
where
    F: Fn(usize, usize) -> bool + Send + Sync,
{
    fn should_render(&self, rendered: usize, accumulated: usize) -> bool {
        self(rendered, accumulated)
    }
}
