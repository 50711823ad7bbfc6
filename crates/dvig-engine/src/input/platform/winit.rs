use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::config::AppSpec;
use crate::input::{Event, EventPump, InputContext, Key};

/// Bootstrap pumps allowed before giving up on window creation.
const MAX_BOOTSTRAP_PUMPS: u32 = 100;

#[derive(Debug, Clone)]
struct WindowConfig {
    title: String,
    size: Option<PhysicalSize<u32>>,
}

/// Window + message pump backed by winit.
///
/// Messages are only processed when [`EventPump::pump`] is called, which keeps
/// the frame loop in charge of the thread instead of winit's own run loop.
pub struct WinitPlatform {
    event_loop: EventLoop<()>,
    config: WindowConfig,
    window: Option<Arc<Window>>,
    exit_reported: bool,
}

impl WinitPlatform {
    /// Creates the event loop and pumps it until the window exists.
    pub fn new(spec: &AppSpec) -> Result<Self> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;

        let config = WindowConfig {
            title: spec.title.clone(),
            size: (!spec.uses_default_size()).then(|| PhysicalSize::new(spec.width, spec.height)),
        };

        let mut platform = Self {
            event_loop,
            config,
            window: None,
            exit_reported: false,
        };

        let mut scratch = InputContext::new();
        for _ in 0..MAX_BOOTSTRAP_PUMPS {
            if let Some(err) = platform.pump_into(&mut scratch, Some(Duration::from_millis(10))) {
                return Err(err);
            }
            if platform.window.is_some() {
                break;
            }
        }

        let window = platform
            .window
            .as_ref()
            .context("platform never resumed; window was not created")?;

        log::info!(
            "window '{}' created ({}x{})",
            platform.config.title,
            window.inner_size().width,
            window.inner_size().height
        );

        Ok(platform)
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }

    /// Current drawable size in physical pixels.
    pub fn drawable_size(&self) -> (u32, u32) {
        self.window
            .as_ref()
            .map(|w| {
                let s = w.inner_size();
                (s.width, s.height)
            })
            .unwrap_or((0, 0))
    }

    fn pump_into(&mut self, input: &mut InputContext, timeout: Option<Duration>) -> Option<anyhow::Error> {
        let mut handler = PumpHandler {
            config: &self.config,
            window: &mut self.window,
            input: &mut *input,
            error: None,
        };

        let status = self.event_loop.pump_app_events(timeout, &mut handler);
        let error = handler.error.take();

        if let PumpStatus::Exit(code) = status {
            if !self.exit_reported {
                log::info!("platform event loop exited with code {code}");
                self.exit_reported = true;
                input.push_event(Event::Close);
            }
        }

        error
    }
}

impl EventPump for WinitPlatform {
    fn pump(&mut self, input: &mut InputContext) {
        if let Some(err) = self.pump_into(input, Some(Duration::ZERO)) {
            log::error!("platform error: {err:#}");
            input.push_event(Event::Close);
        }
    }
}

struct PumpHandler<'a> {
    config: &'a WindowConfig,
    window: &'a mut Option<Arc<Window>>,
    input: &'a mut InputContext,
    error: Option<anyhow::Error>,
}

impl ApplicationHandler for PumpHandler<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut attrs = Window::default_attributes().with_title(self.config.title.clone());
        if let Some(size) = self.config.size {
            attrs = attrs.with_inner_size(size);
        }

        match event_loop.create_window(attrs) {
            Ok(window) => *self.window = Some(Arc::new(window)),
            Err(e) => self.error = Some(anyhow::Error::new(e).context("failed to create window")),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.input.push_event(Event::Close),

            WindowEvent::KeyboardInput { event, .. } => {
                let key = map_key(event.physical_key);
                match event.state {
                    ElementState::Pressed => self.input.press_key(key, event.repeat),
                    ElementState::Released => self.input.release_key(key),
                }
            }

            WindowEvent::Focused(false) => self.input.release_all(),

            WindowEvent::Resized(size) => self.input.notify_resize(size.width, size.height),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = self.window.as_ref() {
                    let size = window.inner_size();
                    self.input.notify_resize(size.width, size.height);
                }
            }

            _ => {}
        }
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    let PhysicalKey::Code(code) = pk else {
        return Key::Unknown(0);
    };

    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,

        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,

        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
        KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,

        KeyCode::KeyA => Key::A,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,

        KeyCode::Digit0 => Key::Digit0,
        KeyCode::Digit1 => Key::Digit1,
        KeyCode::Digit2 => Key::Digit2,
        KeyCode::Digit3 => Key::Digit3,
        KeyCode::Digit4 => Key::Digit4,
        KeyCode::Digit5 => Key::Digit5,
        KeyCode::Digit6 => Key::Digit6,
        KeyCode::Digit7 => Key::Digit7,
        KeyCode::Digit8 => Key::Digit8,
        KeyCode::Digit9 => Key::Digit9,

        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4,
        KeyCode::F5 => Key::F5,
        KeyCode::F6 => Key::F6,
        KeyCode::F7 => Key::F7,
        KeyCode::F8 => Key::F8,
        KeyCode::F9 => Key::F9,
        KeyCode::F10 => Key::F10,
        KeyCode::F11 => Key::F11,
        KeyCode::F12 => Key::F12,

        other => Key::Unknown(other as u32),
    }
}
