use std::time::Duration;

use anyhow::Result;

use crate::config::AppSpec;
use crate::device::Backend;
use crate::diagnostics::ConfigError;
use crate::input::{EventPump, InputContext};
use crate::render::Renderer;
use crate::time::{FixedStep, FrameClock, FrameTime};

use super::app::{App, LoopState};
use super::ctx::FrameCtx;

/// Fixed-timestep frame loop.
///
/// Each iteration drains whole fixed steps from the accumulated real time
/// before the variable update, so fixed-step effects are visible to the render
/// of the same frame. The remainder carries over; no time is dropped.
pub struct FrameDriver {
    fixed: FixedStep,
    clock: FrameClock,
    state: LoopState,
    vsync_interval: u32,
    initialized: bool,
}

impl FrameDriver {
    pub fn new(spec: &AppSpec) -> Result<Self, ConfigError> {
        Ok(Self {
            fixed: FixedStep::new(spec.fixed_dt()?)?,
            clock: FrameClock::new(),
            state: LoopState::Running,
            vsync_interval: spec.vsync_interval,
            initialized: false,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn fixed_step(&self) -> Duration {
        self.fixed.step()
    }

    /// Calls `App::init` unless it already ran.
    pub fn init<B, A>(
        &mut self,
        app: &mut A,
        renderer: &mut Renderer<B>,
        input: &mut InputContext,
        pump: &mut dyn EventPump,
    ) -> Result<()>
    where
        B: Backend,
        A: App<B>,
    {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;

        let time = FrameTime {
            dt: Duration::ZERO,
            elapsed: self.clock.elapsed(),
            frame_index: 0,
        };
        let mut ctx = FrameCtx::new(renderer, input, pump, &mut self.state, time);
        app.init(&mut ctx)
    }

    /// Runs one iteration for a frame that took `time.dt`.
    ///
    /// Returns the number of fixed steps taken.
    pub fn step<B, A>(
        &mut self,
        app: &mut A,
        renderer: &mut Renderer<B>,
        input: &mut InputContext,
        pump: &mut dyn EventPump,
        time: FrameTime,
    ) -> Result<u32>
    where
        B: Backend,
        A: App<B>,
    {
        pump.pump(input);
        if let Some((width, height)) = input.take_resize() {
            renderer.resize(width, height)?;
        }

        let fixed_dt = self.fixed.step().as_secs_f32();
        let dt = time.dt_secs();
        let mut ctx = FrameCtx::new(renderer, input, pump, &mut self.state, time);

        self.fixed.advance(time.dt);
        let mut steps = 0;
        while self.fixed.try_step() {
            app.fixed_update(&mut ctx, fixed_dt)?;
            steps += 1;
        }

        app.update(&mut ctx, dt)?;
        app.render(&mut ctx, dt)?;

        ctx.renderer.present(self.vsync_interval)?;
        Ok(steps)
    }

    /// Iterates until the app or the platform requests close.
    pub fn run<B, A>(
        &mut self,
        app: &mut A,
        renderer: &mut Renderer<B>,
        input: &mut InputContext,
        pump: &mut dyn EventPump,
    ) -> Result<()>
    where
        B: Backend,
        A: App<B>,
    {
        self.init(app, renderer, input, pump)?;

        log::info!(
            "frame loop started ({:?} fixed step, vsync {})",
            self.fixed.step(),
            self.vsync_interval
        );
        self.clock.reset();

        while self.state == LoopState::Running {
            let time = self.clock.tick();
            self.step(app, renderer, input, pump, time)?;
        }

        log::info!("frame loop stopped after {} frames", self.clock.frame_index());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessBackend;
    use crate::diagnostics::ErrorPolicy;
    use crate::input::{Event, NoPump};

    #[derive(Default)]
    struct Counter {
        fixed: u32,
        updates: u32,
        renders: u32,
        close_after: Option<u32>,
    }

    impl<B: Backend> App<B> for Counter {
        fn fixed_update(&mut self, _: &mut FrameCtx<'_, B>, _: f32) -> Result<()> {
            self.fixed += 1;
            Ok(())
        }

        fn update(&mut self, ctx: &mut FrameCtx<'_, B>, _: f32) -> Result<()> {
            self.updates += 1;
            while ctx.poll_event().is_some() {}
            if self.close_after == Some(self.updates) {
                ctx.close();
            }
            Ok(())
        }

        fn render(&mut self, _: &mut FrameCtx<'_, B>, _: f32) -> Result<()> {
            self.renders += 1;
            Ok(())
        }
    }

    fn frame(dt_ms: u64) -> FrameTime {
        FrameTime {
            dt: Duration::from_millis(dt_ms),
            elapsed: Duration::ZERO,
            frame_index: 0,
        }
    }

    fn setup() -> (FrameDriver, Renderer<HeadlessBackend>, InputContext) {
        let spec = AppSpec::default().fixed_ups(50.0);
        let driver = FrameDriver::new(&spec).unwrap();
        let renderer = Renderer::new(HeadlessBackend::default(), ErrorPolicy::propagate_all());
        (driver, renderer, InputContext::new())
    }

    #[test]
    fn fixed_steps_per_frame_follow_the_accumulator() {
        let (mut driver, mut renderer, mut input) = setup();
        let mut app = Counter::default();

        let counts: Vec<u32> = [50, 0, 30]
            .into_iter()
            .map(|ms| {
                driver
                    .step(&mut app, &mut renderer, &mut input, &mut NoPump, frame(ms))
                    .unwrap()
            })
            .collect();

        assert_eq!(counts, vec![2, 0, 2]);
        assert_eq!(app.fixed, 4);
    }

    #[test]
    fn every_iteration_updates_renders_and_presents_once() {
        let (mut driver, mut renderer, mut input) = setup();
        let mut app = Counter::default();

        for _ in 0..3 {
            driver
                .step(&mut app, &mut renderer, &mut input, &mut NoPump, frame(5))
                .unwrap();
        }

        assert_eq!((app.updates, app.renders), (3, 3));
        assert_eq!(renderer.backend().presents(), &[1, 1, 1]);
    }

    #[test]
    fn close_event_ends_the_loop_after_the_current_iteration() {
        let (mut driver, mut renderer, mut input) = setup();
        let mut app = Counter::default();
        input.push_event(Event::Close);

        driver
            .run(&mut app, &mut renderer, &mut input, &mut NoPump)
            .unwrap();

        assert_eq!(driver.state(), LoopState::Closing);
        assert_eq!((app.updates, app.renders), (1, 1));
    }

    #[test]
    fn programmatic_close_stops_run() {
        let (mut driver, mut renderer, mut input) = setup();
        let mut app = Counter {
            close_after: Some(3),
            ..Counter::default()
        };

        driver
            .run(&mut app, &mut renderer, &mut input, &mut NoPump)
            .unwrap();

        assert_eq!(app.renders, 3);
        assert_eq!(renderer.backend().presents().len(), 3);
    }

    #[test]
    fn pending_resize_reaches_the_renderer_before_render() {
        let (mut driver, mut renderer, mut input) = setup();
        let mut app = Counter::default();
        input.notify_resize(320, 200);

        driver
            .step(&mut app, &mut renderer, &mut input, &mut NoPump, frame(0))
            .unwrap();

        assert_eq!(renderer.backend().surface_size(), (320, 200));
        assert_eq!(renderer.viewport().width, 320.0);
    }
}
