use std::time::Duration;

use anyhow::Result;
use dvig_engine::config::{AppSpec, CORE_SHADER_DIR};
use dvig_engine::core::{App, FrameCtx, FrameDriver, LoopState};
use dvig_engine::device::{Backend, HeadlessBackend};
use dvig_engine::diagnostics::ErrorPolicy;
use dvig_engine::glam::{Mat4, Vec2, Vec4};
use dvig_engine::input::{Event, EventPump, InputContext, Key};
use dvig_engine::render::Renderer;
use dvig_engine::time::FrameTime;

/// Delivers each scripted event on the pump call with the matching index.
struct ScriptedPump {
    calls: u32,
    script: Vec<(u32, Event)>,
}

impl ScriptedPump {
    fn new(script: Vec<(u32, Event)>) -> Self {
        Self { calls: 0, script }
    }
}

impl EventPump for ScriptedPump {
    fn pump(&mut self, input: &mut InputContext) {
        self.calls += 1;
        for (_, event) in self.script.iter().filter(|(at, _)| *at == self.calls) {
            if let Event::KeyPressed { key } = event {
                input.press_key(*key, false);
            } else {
                input.push_event(*event);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Init,
    Fixed,
    Update,
    Render,
    Event(Event),
}

#[derive(Default)]
struct Recorder {
    calls: Vec<Call>,
}

impl Recorder {
    fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

impl<B: Backend> App<B> for Recorder {
    fn init(&mut self, _: &mut FrameCtx<'_, B>) -> Result<()> {
        self.calls.push(Call::Init);
        Ok(())
    }

    fn fixed_update(&mut self, _: &mut FrameCtx<'_, B>, dt: f32) -> Result<()> {
        assert!((dt - 0.02).abs() < 1e-6);
        self.calls.push(Call::Fixed);
        Ok(())
    }

    fn update(&mut self, ctx: &mut FrameCtx<'_, B>, _: f32) -> Result<()> {
        self.calls.push(Call::Update);
        while let Some(event) = ctx.poll_event() {
            self.calls.push(Call::Event(event));
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut FrameCtx<'_, B>, _: f32) -> Result<()> {
        self.calls.push(Call::Render);
        ctx.renderer
            .draw_rect(Vec2::ZERO, Vec2::splat(8.0), Vec4::ONE, Mat4::IDENTITY)?;
        Ok(())
    }
}

fn headless() -> Renderer<HeadlessBackend> {
    let mut renderer = Renderer::new(HeadlessBackend::new(320, 240), ErrorPolicy::propagate_all());
    renderer.create_core_resources(CORE_SHADER_DIR).unwrap();
    renderer
}

fn frame(dt_ms: u64, index: u64) -> FrameTime {
    FrameTime {
        dt: Duration::from_millis(dt_ms),
        elapsed: Duration::ZERO,
        frame_index: index,
    }
}

#[test]
fn fixed_steps_run_before_update_and_render_each_frame() {
    let spec = AppSpec::default().fixed_ups(50.0);
    let mut driver = FrameDriver::new(&spec).unwrap();
    let mut renderer = headless();
    let mut input = InputContext::new();
    let mut pump = ScriptedPump::new(Vec::new());
    let mut app = Recorder::default();

    driver
        .init(&mut app, &mut renderer, &mut input, &mut pump)
        .unwrap();

    let mut per_frame = Vec::new();
    for (i, ms) in [50, 0, 30].into_iter().enumerate() {
        let steps = driver
            .step(&mut app, &mut renderer, &mut input, &mut pump, frame(ms, i as u64))
            .unwrap();
        per_frame.push(steps);
    }

    assert_eq!(per_frame, vec![2, 0, 2]);
    assert_eq!(
        app.calls,
        vec![
            Call::Init,
            Call::Fixed,
            Call::Fixed,
            Call::Update,
            Call::Render,
            Call::Update,
            Call::Render,
            Call::Fixed,
            Call::Fixed,
            Call::Update,
            Call::Render,
        ]
    );

    let backend = renderer.backend();
    assert_eq!(backend.presents(), &[1, 1, 1]);
    assert_eq!(backend.draws().count(), 3);
}

#[test]
fn run_drains_events_in_order_and_stops_on_close() {
    let spec = AppSpec::default().fixed_ups(60.0).vsync_interval(0);
    let mut driver = FrameDriver::new(&spec).unwrap();
    let mut renderer = headless();
    let mut input = InputContext::new();
    let mut pump = ScriptedPump::new(vec![
        (3, Event::KeyPressed { key: Key::A }),
        (3, Event::KeyPressed { key: Key::B }),
        (6, Event::Close),
    ]);
    let mut app = Recorder::default();

    driver
        .run(&mut app, &mut renderer, &mut input, &mut pump)
        .unwrap();

    assert_eq!(driver.state(), LoopState::Closing);
    let events: Vec<&Call> = app
        .calls
        .iter()
        .filter(|c| matches!(c, Call::Event(_)))
        .collect();
    assert_eq!(
        events,
        vec![
            &Call::Event(Event::KeyPressed { key: Key::A }),
            &Call::Event(Event::KeyPressed { key: Key::B }),
            &Call::Event(Event::Close),
        ]
    );
    assert!(input.is_key_down(Key::A));

    // The closing iteration still renders and presents.
    assert_eq!(app.calls.last(), Some(&Call::Render));
    let renders = app.count(&Call::Render);
    assert_eq!(renderer.backend().presents().len(), renders);
    assert!(renderer.backend().presents().iter().all(|&i| i == 0));
}
