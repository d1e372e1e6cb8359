use crate::canvas::Canvas;
use crate::error::Result;
use crate::info::InfoKey;
use crate::input::ContentClick;

/// The application side of the engine.
///
/// `paint_content` runs on the render path once per new frame. The two notifications run
/// on their own worker threads, so implementations use interior mutability.
pub trait VisHost: Send + Sync + 'static {
    fn paint_content(&self, canvas: &mut dyn Canvas) -> Result<()>;

    fn content_clicked(&self, _click: ContentClick) {}

    fn check_changed(&self, _key: &InfoKey, _checked: bool) {}
}
