use std::sync::Arc;
use std::thread;

use crate::info::InfoKey;
use crate::state::{lock, SharedState, VisState};
use crate::traits::VisHost;
use crate::utils::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Other(u16),
}

/// A pointer press in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Position,
    pub button: MouseButton,
    pub click_count: u32,
}

impl PointerEvent {
    pub fn press(x: f32, y: f32, button: MouseButton) -> Self {
        Self {
            position: Position::new(x, y),
            button,
            click_count: 1,
        }
    }
}

/// A press inside the content viewport, in logical content coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentClick {
    pub x: f32,
    pub y: f32,
    pub button: MouseButton,
    pub click_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Content(ContentClick),
    Toggled { key: InfoKey, checked: bool },
    Ignored,
}

/// Turns pointer presses into host notifications.
///
/// Routing happens under the state lock; the host is always called afterwards, on a
/// fresh worker thread.
#[derive(Clone)]
pub struct InteractionRouter {
    state: SharedState,
    host: Arc<dyn VisHost>,
}

impl InteractionRouter {
    pub fn new(state: SharedState, host: Arc<dyn VisHost>) -> Self {
        Self { state, host }
    }

    pub fn dispatch(&self, event: PointerEvent) -> Dispatch {
        let outcome = route(&mut lock(&self.state), event);
        match &outcome {
            Dispatch::Content(click) => {
                let host = Arc::clone(&self.host);
                let click = *click;
                log::debug!("content click at ({}, {})", click.x, click.y);
                spawn_worker("content-click", move || host.content_clicked(click));
            }
            Dispatch::Toggled { key, checked } => {
                let host = Arc::clone(&self.host);
                let (key, checked) = (key.clone(), *checked);
                log::debug!("checkbox {key} toggled to {checked}");
                spawn_worker("check-changed", move || host.check_changed(&key, checked));
            }
            Dispatch::Ignored => {}
        }
        outcome
    }
}

/// Content clicks win over any checkbox overlapping the viewport.
fn route(state: &mut VisState, event: PointerEvent) -> Dispatch {
    if let Some(viewport) = state.viewport.filter(|vp| vp.contains(event.position)) {
        let p = viewport.to_content(event.position);
        return Dispatch::Content(ContentClick {
            x: p.x,
            y: p.y,
            button: event.button,
            click_count: event.click_count,
        });
    }
    let hit = state.history.hit_regions().and_then(|r| r.hit(event.position));
    let Some(key) = hit.cloned() else {
        return Dispatch::Ignored;
    };
    let Some(checked) = state.history.current_mut().and_then(|f| f.toggle(&key)) else {
        return Dispatch::Ignored;
    };
    state.panel.set_checked(&key, checked);
    Dispatch::Toggled { key, checked }
}

fn spawn_worker<F>(name: &str, f: F)
where
    F: FnOnce() + Send + 'static,
{
    if let Err(e) = thread::Builder::new()
        .name(format!("vis-{name}"))
        .spawn(f)
    {
        log::error!("failed to start {name} worker: {e}");
    }
}
