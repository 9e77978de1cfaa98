//! Per-configuration warmup/sampling state machine and the sweep runner.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use crate::{
    bench::{
        config::{BenchConfig, BenchConfiguration},
        report::{BenchResult, FrameLog},
        stats::FpsStats,
    },
    foundation::core::{BackendKind, Frame, Resolution},
    foundation::error::{VidfxError, VidfxResult},
    render::backend::{FrameBackend, FrameSettings},
    source::FrameSource,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Warming,
    Sampling,
    Recorded,
}

/// Monotonic time source, as an offset from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Operator stop request, shared across threads.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Warmup and sampling windows of one configuration.
///
/// Window time is the sum of intervals between consecutive presented frames, so ticks
/// without a usable frame advance neither window.
#[derive(Clone, Debug)]
pub struct PhaseTracker {
    phase: Phase,
    warmup: Duration,
    sample: Duration,
    elapsed: Duration,
    last: Option<Duration>,
    samples: Vec<f64>,
}

impl PhaseTracker {
    pub fn new(warmup: Duration, sample: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            warmup,
            sample,
            elapsed: Duration::ZERO,
            last: None,
            samples: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn start(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = if self.warmup.is_zero() {
                Phase::Sampling
            } else {
                Phase::Warming
            };
        }
    }

    /// Record a presented frame at `now`. Returns the fps sample taken, if any.
    pub fn frame_presented(&mut self, now: Duration) -> Option<f64> {
        let prev = self.last.replace(now)?;
        let dt = now.saturating_sub(prev);
        self.elapsed += dt;
        match self.phase {
            Phase::Warming => {
                if self.elapsed >= self.warmup {
                    self.phase = Phase::Sampling;
                    self.elapsed = Duration::ZERO;
                }
                None
            }
            Phase::Sampling => {
                let sample = (!dt.is_zero()).then(|| 1.0 / dt.as_secs_f64());
                if let Some(fps) = sample {
                    self.samples.push(fps);
                }
                if self.elapsed >= self.sample {
                    self.phase = Phase::Recorded;
                }
                sample
            }
            Phase::Idle | Phase::Recorded => None,
        }
    }

    /// A tick without a usable frame: drop the inter-frame anchor.
    pub fn frame_skipped(&mut self) {
        self.last = None;
    }

    pub fn finish(&mut self) -> FpsStats {
        self.phase = Phase::Recorded;
        FpsStats::from_samples(&self.samples)
    }
}

fn usable(frame: Option<Frame>, resolution: Resolution) -> Option<Frame> {
    frame.filter(|f| !f.is_empty() && f.resolution() == resolution && f.is_well_formed())
}

/// Runs the configuration matrix of a [`BenchConfig`] against a frame source.
pub struct BenchDriver<C: Clock = MonotonicClock> {
    config: BenchConfig,
    clock: C,
    stop: StopFlag,
    frame_log: Option<FrameLog>,
}

impl<C: Clock> BenchDriver<C> {
    pub fn new(config: BenchConfig, clock: C, stop: StopFlag) -> VidfxResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            stop,
            frame_log: None,
        })
    }

    pub fn with_frame_log(mut self, log: FrameLog) -> Self {
        self.frame_log = Some(log);
        self
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Run every configuration in order.
    ///
    /// `make_backend` is called once per distinct backend kind before anything is sampled, so
    /// a backend that cannot be created fails the sweep up front. A configuration that fails
    /// while running ends the sweep, and the rows recorded so far are returned. The same holds
    /// when the stop flag is raised: the configuration in flight is dropped.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        make_backend: &mut dyn FnMut(BackendKind) -> VidfxResult<Box<dyn FrameBackend>>,
    ) -> VidfxResult<Vec<BenchResult>> {
        let configurations = self.config.configurations();
        let mut results = Vec::with_capacity(configurations.len());
        if self.stop.is_raised() {
            return Ok(results);
        }

        let mut backends: Vec<Box<dyn FrameBackend>> = Vec::new();
        for &kind in &self.config.backends {
            if backends.iter().all(|b| b.kind() != kind) {
                backends.push(make_backend(kind)?);
                tracing::debug!(backend = %kind, "backend ready");
            }
        }
        tracing::info!(count = configurations.len(), "benchmark sweep starting");

        for c in &configurations {
            if self.stop.is_raised() {
                break;
            }
            let Some(backend) = backends.iter_mut().find(|b| b.kind() == c.backend) else {
                return Err(VidfxError::validation(format!("no backend for {c}")));
            };
            match self.run_configuration(c, source, backend.as_mut()) {
                Ok(Some(result)) => {
                    tracing::info!(summary = %result.summary_line(), "configuration recorded");
                    results.push(result);
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(
                        config = %c,
                        error = %e,
                        recorded = results.len(),
                        "configuration failed, sweep ended"
                    );
                    break;
                }
            }
        }

        if self.stop.is_raised() {
            tracing::warn!(
                recorded = results.len(),
                total = configurations.len(),
                "benchmark stopped early"
            );
        }
        if let Some(log) = self.frame_log.as_mut() {
            log.flush()?;
        }
        Ok(results)
    }

    /// Warm up then sample one configuration. `None` when stopped before recording.
    #[tracing::instrument(skip_all, fields(config = %c))]
    pub fn run_configuration(
        &mut self,
        c: &BenchConfiguration,
        source: &mut dyn FrameSource,
        backend: &mut dyn FrameBackend,
    ) -> VidfxResult<Option<BenchResult>> {
        let settings: FrameSettings = self.config.settings_for(c);
        backend.resize(c.resolution)?;

        let mut tracker = PhaseTracker::new(self.config.warmup(), self.config.sample());
        tracker.start();
        tracing::debug!(phase = ?tracker.phase(), "configuration started");
        let mut idle_ticks = 0u32;

        while tracker.phase() != Phase::Recorded {
            if self.stop.is_raised() {
                return Ok(None);
            }
            let Some(frame) = usable(source.next_frame(c.resolution), c.resolution) else {
                tracker.frame_skipped();
                idle_ticks += 1;
                if idle_ticks >= self.config.max_idle_ticks {
                    tracing::warn!(idle_ticks, "no usable frames, recording what was sampled");
                    break;
                }
                continue;
            };
            idle_ticks = 0;

            backend.render(&frame, &settings)?;
            let now = self.clock.now();
            let before = tracker.phase();
            let sample = tracker.frame_presented(now);
            if before == Phase::Warming && tracker.phase() == Phase::Sampling {
                tracing::debug!("warmup done");
            }
            if let (Some(fps), Some(log)) = (sample, self.frame_log.as_mut()) {
                log.log(now.as_secs_f64(), c, fps)?;
            }
        }

        Ok(Some(BenchResult::new(c, tracker.finish())))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bench/driver.rs"]
mod tests;
