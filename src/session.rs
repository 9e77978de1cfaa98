use std::time::Duration;

use crate::{
    bench::{
        driver::{Clock, MonotonicClock},
        stats::FpsAverager,
    },
    control::{ControlInput, ControlState},
    foundation::core::{BackendKind, Frame, Resolution},
    foundation::error::{VidfxError, VidfxResult},
    render::backend::{FrameBackend, FrameSettings},
    source::FrameSource,
};

pub type BackendFactory = Box<dyn FnMut(BackendKind) -> VidfxResult<Box<dyn FrameBackend>>>;

/// Outcome of one live tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub state: ControlState,
    /// Sliding-window average over recent frames.
    pub fps: f64,
    /// False when the source had no usable frame this tick.
    pub presented: bool,
}

impl TickReport {
    /// `[Interactive] Mode=GPU | Filter=Pixelate | Transform=ON | FPS=60`
    pub fn title(&self) -> String {
        format!(
            "[Interactive] Mode={} | Filter={} | Transform={} | FPS={}",
            self.state.backend,
            self.state.filter,
            if self.state.transform_enabled { "ON" } else { "OFF" },
            self.fps.round() as i64
        )
    }
}

/// Interactive loop body: latest control state, one frame per tick, rolling fps.
pub struct LiveSession<C: Clock = MonotonicClock> {
    state: ControlState,
    settings: FrameSettings,
    resolution: Resolution,
    backends: Vec<Box<dyn FrameBackend>>,
    make_backend: BackendFactory,
    averager: FpsAverager,
    clock: C,
    last: Option<Duration>,
}

impl<C: Clock> LiveSession<C> {
    pub fn new(
        state: ControlState,
        resolution: Resolution,
        clock: C,
        make_backend: BackendFactory,
    ) -> VidfxResult<Self> {
        let mut session = Self {
            state,
            settings: state.settings().sanitized(),
            resolution,
            backends: Vec::new(),
            make_backend,
            averager: FpsAverager::default(),
            clock,
            last: None,
        };
        session.backend_mut(state.backend)?;
        Ok(session)
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn backend_mut(&mut self, kind: BackendKind) -> VidfxResult<&mut Box<dyn FrameBackend>> {
        let idx = match self.backends.iter().position(|b| b.kind() == kind) {
            Some(i) => i,
            None => {
                let mut backend = (self.make_backend)(kind)?;
                backend.resize(self.resolution)?;
                tracing::info!(backend = %kind, "live backend ready");
                self.backends.push(backend);
                self.backends.len() - 1
            }
        };
        Ok(&mut self.backends[idx])
    }

    /// Apply one input. If it selects a backend that cannot be created, the previous state is
    /// kept and the error returned.
    pub fn handle(&mut self, input: ControlInput) -> VidfxResult<()> {
        let next = self.state.apply(input);
        if next.backend != self.state.backend {
            self.backend_mut(next.backend)?;
        }
        self.state = next;
        self.settings = next.settings().sanitized();
        Ok(())
    }

    pub fn tick(&mut self, source: &mut dyn FrameSource) -> VidfxResult<TickReport> {
        let frame = source
            .next_frame(self.resolution)
            .filter(|f| !f.is_empty() && f.is_well_formed());
        let Some(frame) = frame else {
            tracing::debug!("no frame this tick");
            return Ok(TickReport {
                state: self.state,
                fps: self.averager.average(),
                presented: false,
            });
        };
        if frame.resolution() != self.resolution {
            tracing::debug!(from = %self.resolution, to = %frame.resolution(), "source resolution changed");
            self.resolution = frame.resolution();
            let resolution = self.resolution;
            for b in &mut self.backends {
                b.resize(resolution)?;
            }
        }

        let settings = self.settings;
        self.backend_mut(self.state.backend)?
            .render(&frame, &settings)?;

        let now = self.clock.now();
        let fps = match self.last.replace(now) {
            Some(prev) => self.averager.push_interval(now.saturating_sub(prev).as_secs_f64()),
            None => self.averager.average(),
        };
        Ok(TickReport {
            state: self.state,
            fps,
            presented: true,
        })
    }

    /// The last presented frame of the active backend.
    pub fn last_output(&mut self) -> VidfxResult<Frame> {
        let kind = self.state.backend;
        self.backends
            .iter_mut()
            .find(|b| b.kind() == kind)
            .ok_or_else(|| VidfxError::validation(format!("{kind} backend not created")))?
            .readback()
    }
}

#[cfg(test)]
#[path = "../tests/unit/session/session.rs"]
mod tests;
