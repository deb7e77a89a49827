//! 运行编排：下发配置 → 启动协议并等待收敛 → 启动流量并轮询指标 → 停止

use super::settings::{ProtocolsMode, RunSettings};
use super::targets::{BgpTargets, TrafficProgress, TrafficTargets, traffic_progress};
use crate::api::OtgApi;
use crate::error::Result;
use crate::otg::{Config, ControlState, MetricKind, MetricsRequest, MetricsResponse, State};
use std::io::Write;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// How a run ended. Both timeouts are failures for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Wall-clock timeout hit while traffic was running; traffic was stopped.
    TrafficTimedOut,
    /// BGP did not converge in time; protocols were stopped.
    ConvergenceTimedOut,
}

impl RunOutcome {
    pub fn is_success(self) -> bool {
        self == RunOutcome::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Convergence {
    Converged,
    TimedOut,
}

pub struct Orchestrator<'a, A: OtgApi + ?Sized> {
    api: &'a mut A,
    settings: &'a RunSettings,
    out: &'a mut dyn Write,
}

impl<'a, A: OtgApi + ?Sized> Orchestrator<'a, A> {
    pub fn new(api: &'a mut A, settings: &'a RunSettings, out: &'a mut dyn Write) -> Self {
        Orchestrator { api, settings, out }
    }

    /// 执行一次完整运行。`document` 原样提交，`config` 用于计算目标。
    pub fn run(&mut self, document: &serde_json::Value, config: &Config) -> Result<RunOutcome> {
        info!("Applying OTG config...");
        self.api.set_config(document)?.into_ack()?;
        info!("ready.");

        let started = Instant::now();
        let manage_protocols =
            self.settings.protocols != ProtocolsMode::Ignore && !config.devices.is_empty();

        if manage_protocols {
            self.set_state(ControlState::protocols(State::Start))?;
            if self.wait_for_protocols(config, started)? == Convergence::TimedOut {
                error!("Timed out waiting for protocols to come up, stopping protocols");
                self.set_state(ControlState::protocols(State::Stop))?;
                return Ok(RunOutcome::ConvergenceTimedOut);
            }
        }

        let targets = TrafficTargets::from_config(config);
        info!(
            packets = targets.packets,
            eta_secs = targets.eta.as_secs(),
            "Starting traffic..."
        );
        self.set_state(ControlState::traffic(State::Start))?;
        let timed_out = self.poll_traffic(&targets, started)?;

        info!("Stopping traffic...");
        self.set_state(ControlState::traffic(State::Stop))?;
        if manage_protocols && self.settings.protocols == ProtocolsMode::Auto {
            info!("Stopping protocols...");
            self.set_state(ControlState::protocols(State::Stop))?;
        }

        if timed_out {
            error!("Timed out waiting for traffic to finish");
            Ok(RunOutcome::TrafficTimedOut)
        } else {
            info!("stopped.");
            Ok(RunOutcome::Completed)
        }
    }

    fn set_state(&mut self, state: ControlState) -> Result<()> {
        debug!(state = %state.describe(), "setting control state");
        self.api.set_control_state(&state)?.into_ack()
    }

    fn fetch(&mut self, kind: MetricKind) -> Result<MetricsResponse> {
        self.api
            .get_metrics(&MetricsRequest::new(kind))?
            .into_metrics()
    }

    fn print(&mut self, metrics: &MetricsResponse) -> Result<()> {
        serde_json::to_writer(&mut *self.out, metrics)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }

    fn timed_out(&self, started: Instant) -> bool {
        self.settings
            .timeout
            .is_some_and(|limit| started.elapsed() >= limit)
    }

    fn wait_for_protocols(&mut self, config: &Config, started: Instant) -> Result<Convergence> {
        let targets = BgpTargets::from_config(config, self.settings.rx_bgp);
        if targets.is_empty() {
            debug!("no BGP peers configured, skipping convergence wait");
            return Ok(Convergence::Converged);
        }
        info!(peers = targets.peers.len(), "Waiting for BGP4 protocol to come up...");
        loop {
            let snapshot = self.fetch(MetricKind::Bgpv4)?;
            if self.settings.metrics.bgp4 {
                self.print(&snapshot)?;
            }
            if targets.converged(&snapshot) {
                info!("BGP4 protocol is up.");
                return Ok(Convergence::Converged);
            }
            if self.timed_out(started) {
                return Ok(Convergence::TimedOut);
            }
            thread::sleep(self.settings.interval);
        }
    }

    /// Polls until traffic finishes; returns true on wall-clock timeout.
    fn poll_traffic(&mut self, targets: &TrafficTargets, started: Instant) -> Result<bool> {
        let selection = self.settings.metrics;
        let driver = selection.driver();
        let traffic_started = Instant::now();
        loop {
            let mut driving = None;
            for kind in selection.traffic_kinds() {
                let snapshot = self.fetch(kind)?;
                self.print(&snapshot)?;
                if kind == driver {
                    driving = Some(snapshot);
                }
            }
            // bgp4 alone still needs port counters to know when to stop.
            let driving = match driving {
                Some(s) => s,
                None => self.fetch(driver)?,
            };

            match traffic_progress(
                driver,
                &driving,
                targets,
                traffic_started.elapsed(),
                self.settings.xeta,
            ) {
                TrafficProgress::Done => return Ok(false),
                TrafficProgress::EtaExceeded => {
                    warn!(
                        eta_secs = targets.eta.as_secs(),
                        xeta = self.settings.xeta,
                        "Traffic has been running longer than the expected ETA, stopping"
                    );
                    return Ok(false);
                }
                TrafficProgress::Running => {}
            }
            if self.timed_out(started) {
                return Ok(true);
            }
            thread::sleep(self.settings.interval);
        }
    }
}
