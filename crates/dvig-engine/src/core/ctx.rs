use crate::device::Backend;
use crate::input::{Event, EventPump, InputContext, Key};
use crate::render::Renderer;
use crate::time::FrameTime;

use super::app::LoopState;

/// Per-call context handed to [`App`](super::App) hooks.
pub struct FrameCtx<'a, B: Backend> {
    pub renderer: &'a mut Renderer<B>,
    pub input: &'a mut InputContext,
    pub time: FrameTime,
    pump: &'a mut dyn EventPump,
    state: &'a mut LoopState,
}

impl<'a, B: Backend> FrameCtx<'a, B> {
    pub(crate) fn new(
        renderer: &'a mut Renderer<B>,
        input: &'a mut InputContext,
        pump: &'a mut dyn EventPump,
        state: &'a mut LoopState,
        time: FrameTime,
    ) -> Self {
        Self {
            renderer,
            input,
            time,
            pump,
            state,
        }
    }

    /// Pumps the platform once and returns the oldest pending event.
    ///
    /// Handing out [`Event::Close`] also moves the loop to [`LoopState::Closing`].
    pub fn poll_event(&mut self) -> Option<Event> {
        let event = self.input.poll_next_event(&mut *self.pump);
        if event == Some(Event::Close) {
            *self.state = LoopState::Closing;
        }
        event
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.input.is_key_down(key)
    }

    /// Requests loop termination after the current iteration.
    pub fn close(&mut self) {
        if *self.state == LoopState::Running {
            log::info!("close requested");
        }
        *self.state = LoopState::Closing;
    }

    pub fn is_closing(&self) -> bool {
        *self.state == LoopState::Closing
    }
}
