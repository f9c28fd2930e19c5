//! # Console Engine
//!
//! Periodic protocol engine driving one game session.
//!
//! ## Tasks
//!
//! | Task | Default period | Work |
//! |------|----------------|------|
//! | Control exchange | 50 ms | sample inputs, send throttle + roll, receive and apply telemetry |
//! | Dashboard publish | 1000 ms | send six single-field frames to the dashboard |
//! | Status check | 500 ms | publish once more, then evaluate the session state machine |
//!
//! All three run on one dispatch loop, so no task overlaps with itself or the
//! others. The only state shared with other threads is the boost flag (written
//! by the input edge source) and the telemetry store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::Config;
use crate::input::{BoostSwitch, InputSampler};
use crate::link::socket_trait::DatagramIo;
use crate::link::ControlLink;
use crate::presentation::{AudioCue, IndicatorPattern, Presentation};
use crate::protocol::decoder::decode_telemetry;
use crate::protocol::encoder::{encode_control_commands, encode_dashboard_frames};
use crate::protocol::types::{ControlInput, TelemetryState, TelemetryUpdate, ThrottleRules};
use crate::session::{SessionMachine, SessionOutcome, SessionState};
use crate::telemetry::TelemetryStore;

/// Upper bound on extra datagrams drained in one control cycle
const MAX_QUEUED_REPLIES: usize = 16;

/// Periods of the three recurring tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePeriods {
    pub control: Duration,
    pub dashboard: Duration,
    pub status: Duration,
}

impl Default for SchedulePeriods {
    fn default() -> Self {
        Self {
            control: Duration::from_millis(50),
            dashboard: Duration::from_millis(1000),
            status: Duration::from_millis(500),
        }
    }
}

/// Why [`ConsoleEngine::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The session reached a terminal state
    Finished(SessionOutcome),
    /// The shutdown future completed first
    Interrupted,
}

/// Owns every piece of session state and runs the periodic tasks
pub struct ConsoleEngine<S: DatagramIo> {
    link: ControlLink<S>,
    sampler: Box<dyn InputSampler>,
    boost: BoostSwitch,
    store: TelemetryStore,
    session: SessionMachine,
    presentation: Arc<dyn Presentation>,
    rules: ThrottleRules,
    periods: SchedulePeriods,
    recv_buffer: Vec<u8>,
    rejected_lines: u64,
}

impl<S: DatagramIo> ConsoleEngine<S> {
    /// Assemble an engine
    ///
    /// `max_datagram_size` bounds one telemetry datagram; the receive buffer
    /// is one byte larger so a datagram that would be truncated is detected.
    pub fn new(
        link: ControlLink<S>,
        sampler: Box<dyn InputSampler>,
        boost: BoostSwitch,
        presentation: Arc<dyn Presentation>,
        rules: ThrottleRules,
        periods: SchedulePeriods,
        max_datagram_size: usize,
    ) -> Self {
        Self {
            link,
            sampler,
            boost,
            store: TelemetryStore::new(),
            session: SessionMachine::new(),
            presentation,
            rules,
            periods,
            recv_buffer: vec![0u8; max_datagram_size + 1],
            rejected_lines: 0,
        }
    }

    /// Assemble an engine with rules and periods taken from configuration
    pub fn from_config(
        config: &Config,
        link: ControlLink<S>,
        sampler: Box<dyn InputSampler>,
        boost: BoostSwitch,
        presentation: Arc<dyn Presentation>,
    ) -> Self {
        let rules = ThrottleRules {
            boost_offset: config.control.boost_offset,
            clamp: config.control.clamp_throttle,
        };
        let periods = SchedulePeriods {
            control: Duration::from_millis(config.schedule.control_period_ms),
            dashboard: Duration::from_millis(config.schedule.dashboard_period_ms),
            status: Duration::from_millis(config.schedule.status_period_ms),
        };
        Self::new(
            link,
            sampler,
            boost,
            presentation,
            rules,
            periods,
            config.link.max_datagram_size,
        )
    }

    /// One control cycle
    ///
    /// Samples the inputs, sends the throttle and roll commands, waits (bounded)
    /// for a lander datagram and merges it into the telemetry store, followed by
    /// any further datagrams already queued behind it.
    ///
    /// If either command fails to send the cycle stops there and telemetry is
    /// left unchanged. A failed or timed-out receive also leaves it unchanged.
    ///
    /// Returns the control values computed, or `None` once the session is over.
    pub async fn control_exchange(&mut self) -> Option<ControlInput> {
        if self.session.is_terminal() {
            return None;
        }

        let telemetry = self.store.snapshot();
        let input = ControlInput::compute(
            self.sampler.sample_throttle(),
            self.sampler.sample_roll(),
            self.boost.is_engaged(),
            &telemetry,
            &self.rules,
        );
        self.presentation.show_controls(&input);

        let mut all_sent = true;
        for command in encode_control_commands(&input) {
            if let Err(e) = self.link.send_lander(&command).await {
                debug!("Control command not sent: {}", e);
                all_sent = false;
            }
        }
        if !all_sent {
            debug!("Control cycle skipped after send failure");
            return Some(input);
        }

        match self.link.recv_lander(&mut self.recv_buffer).await {
            Ok(len) => self.apply_datagram(len),
            Err(e) => {
                debug!("No telemetry this cycle: {}", e);
                return Some(input);
            }
        }

        // Replies that queued up behind the first one, oldest first
        for _ in 0..MAX_QUEUED_REPLIES {
            match self.link.try_recv_lander(&mut self.recv_buffer).await {
                Ok(Some(len)) => self.apply_datagram(len),
                Ok(None) => break,
                Err(e) => {
                    debug!("Dropped queued telemetry: {}", e);
                    break;
                }
            }
        }

        Some(input)
    }

    /// Send the current telemetry to the dashboard as six independent frames
    pub async fn publish_dashboard(&mut self) {
        let snapshot = self.store.snapshot();
        for frame in encode_dashboard_frames(&snapshot) {
            if let Err(e) = self.link.send_dash(&frame).await {
                debug!("Dashboard frame not sent: {}", e);
            }
        }
    }

    /// Status check: flush the dashboard, then evaluate the session.
    ///
    /// Returns the outcome on the cycle the session ends, `None` otherwise.
    pub async fn check_status(&mut self) -> Option<SessionOutcome> {
        if self.session.is_terminal() {
            return None;
        }

        self.publish_dashboard().await;

        let snapshot = self.store.snapshot();
        let outcome = self.session.evaluate(&snapshot)?;
        info!("Session over: {:?}", outcome);
        self.presentation.show_outcome(outcome);
        Some(outcome)
    }

    /// Run the periodic tasks until the session ends or `shutdown` completes
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use lander_console::config::Config;
    /// use lander_console::engine::ConsoleEngine;
    /// use lander_console::input::{BoostSwitch, FixedInput};
    /// use lander_console::link::ControlLink;
    /// use lander_console::presentation::LogPresentation;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let config = Config::default();
    ///     let link = ControlLink::bind(&config.link).await?;
    ///     let mut engine = ConsoleEngine::from_config(
    ///         &config,
    ///         link,
    ///         Box::new(FixedInput::new(0.5, 0.5)),
    ///         BoostSwitch::new(),
    ///         Arc::new(LogPresentation::new()),
    ///     );
    ///     let end = engine.run(async { let _ = tokio::signal::ctrl_c().await; }).await;
    ///     println!("{:?}", end);
    ///     Ok(())
    /// }
    /// ```
    pub async fn run<F>(&mut self, shutdown: F) -> SessionEnd
    where
        F: Future<Output = ()>,
    {
        let mut control = ticker(self.periods.control);
        let mut dashboard = ticker(self.periods.dashboard);
        let mut status = ticker(self.periods.status);
        tokio::pin!(shutdown);

        info!(
            "Session started (control {:?}, dashboard {:?}, status {:?})",
            self.periods.control, self.periods.dashboard, self.periods.status
        );

        loop {
            tokio::select! {
                _ = control.tick() => {
                    self.control_exchange().await;
                }
                _ = dashboard.tick() => {
                    self.publish_dashboard().await;
                }
                _ = status.tick() => {
                    if let Some(outcome) = self.check_status().await {
                        return SessionEnd::Finished(outcome);
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested, leaving session");
                    return SessionEnd::Interrupted;
                }
            }
        }
    }

    /// Clear telemetry, boost and the session phase for a new game
    pub fn reset(&mut self) {
        self.store.reset();
        self.boost.fall();
        self.session.reset();
        info!("Session reset");
    }

    fn apply_datagram(&mut self, len: usize) {
        let update = decode_telemetry(&self.recv_buffer[..len]);
        self.rejected_lines += update.rejected_lines as u64;
        if self.store.apply(&update) {
            self.present_update(&update);
        }
    }

    fn present_update(&self, update: &TelemetryUpdate) {
        if let Some(altitude) = update.altitude {
            self.presentation.audio(AudioCue::for_altitude(altitude));
        }
        if let Some(crashed) = update.crashed {
            self.presentation.indicator(IndicatorPattern::for_crashed(crashed));
        }
    }

    pub fn telemetry(&self) -> TelemetryState {
        self.store.snapshot()
    }

    /// Handle for concurrent readers of the telemetry store
    pub fn store(&self) -> TelemetryStore {
        self.store.clone()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn link(&self) -> &ControlLink<S> {
        &self.link
    }

    /// Telemetry lines dropped as malformed since the engine was created
    pub fn rejected_lines(&self) -> u64 {
        self.rejected_lines
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}
