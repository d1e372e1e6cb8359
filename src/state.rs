use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::history::FrameHistory;
use crate::info::InfoPanel;
use crate::layout::ContentViewport;

/// State shared by the render path, host-side panel updates and pointer dispatch.
#[derive(Debug, Default)]
pub struct VisState {
    pub history: FrameHistory,
    /// Entries collected for the frame that has not been recorded yet.
    pub panel: InfoPanel,
    /// Content placement of the most recent render.
    pub viewport: Option<ContentViewport>,
}

pub type SharedState = Arc<Mutex<VisState>>;

pub fn shared() -> SharedState {
    Arc::new(Mutex::new(VisState::default()))
}

/// Locks the shared state. A panic on another thread does not make the state unusable:
/// every critical section leaves it consistent.
pub fn lock(state: &SharedState) -> MutexGuard<'_, VisState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
