use anyhow::Result;

use crate::device::Backend;

use super::ctx::FrameCtx;

/// Whether the frame loop keeps iterating.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum LoopState {
    #[default]
    Running,
    /// Terminal. The current iteration completes, then the loop exits.
    Closing,
}

/// Host application driven by [`FrameDriver`](super::FrameDriver).
///
/// Per iteration: zero or more `fixed_update` calls with the fixed step, then
/// exactly one `update` and one `render` with the measured frame delta. Returning
/// an error stops the loop and surfaces the error from `run`.
pub trait App<B: Backend> {
    /// Called once before the first iteration, after core resources exist.
    fn init(&mut self, ctx: &mut FrameCtx<'_, B>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    fn fixed_update(&mut self, ctx: &mut FrameCtx<'_, B>, dt: f32) -> Result<()>;

    fn update(&mut self, ctx: &mut FrameCtx<'_, B>, dt: f32) -> Result<()>;

    fn render(&mut self, ctx: &mut FrameCtx<'_, B>, dt: f32) -> Result<()>;
}
