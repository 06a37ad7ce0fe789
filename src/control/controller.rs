//! The control loop
//!
//! Ties the reader, safety layer, curves, and actuator client together:
//! initialization and baseline speeds, periodic monitoring with command
//! dedup, emergency propagation across zones sharing an actuator target,
//! proactive session health checks, and best-effort safe-speed shutdown.

use crate::actuator::{ActuatorClient, ActuatorCommand};
use crate::control::{
    CancelToken, EmergencyReason, LoopState, SafetyDecision, SafetyOverride, ZoneState,
};
use crate::domain::{FanSpeed, Reading, ThermalZone};
use crate::error::{AppError, Result};
use crate::sensors::TemperatureReader;

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Sleep slice while waiting, so cancellation is honored promptly
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Reachability probe cadence during initialization
const STARTUP_PROBE_INTERVAL: Duration = Duration::from_secs(5);

/// Loop-level settings (zone-independent)
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Wall-clock interval between monitoring ticks
    pub interval: Duration,
    /// Proactively revalidate the session every this many cycles
    pub health_check_cycles: u64,
    /// Bounded wait for the actuator to become reachable at startup
    pub startup_wait: Duration,
    /// Speed applied to every zone during shutdown
    pub shutdown_speed: FanSpeed,
    /// Log decisions without commanding the actuator
    pub dry_run: bool,
    /// Controller firmware sensors to disable at startup, so the firmware
    /// cannot override user-set speeds
    pub disable_sensors: Vec<u8>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            health_check_cycles: 10,
            startup_wait: Duration::from_secs(60),
            shutdown_speed: FanSpeed::MAX,
            dry_run: false,
            disable_sensors: Vec::new(),
        }
    }
}

/// The per-host control loop
pub struct Controller {
    zones: Vec<ThermalZone>,
    reader: TemperatureReader,
    client: Arc<ActuatorClient>,
    safety: SafetyOverride,
    config: ControllerConfig,
    cancel: CancelToken,
    states: HashMap<String, ZoneState>,
    loop_state: LoopState,
}

impl Controller {
    /// Create a controller over configured zones
    pub fn new(
        zones: Vec<ThermalZone>,
        reader: TemperatureReader,
        client: Arc<ActuatorClient>,
        safety: SafetyOverride,
        mut config: ControllerConfig,
        cancel: CancelToken,
    ) -> Self {
        // zero would divide-by-zero the health check cadence
        config.health_check_cycles = config.health_check_cycles.max(1);
        let states = zones
            .iter()
            .map(|z| (z.id.clone(), ZoneState::new()))
            .collect();
        Self {
            zones,
            reader,
            client,
            safety,
            config,
            cancel,
            states,
            loop_state: LoopState::Initializing,
        }
    }

    /// Current lifecycle state
    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    /// Run until cancelled: initialize, monitor, shut down
    pub fn run(&mut self) -> Result<()> {
        self.initialize()?;

        let mut cycle: u64 = 0;
        while !self.cancel.is_cancelled() {
            cycle += 1;
            let started = Instant::now();

            // Iteration-boundary recovery: one bad cycle never takes the
            // process (and with it all fan control) down
            if let Err(err) = self.tick(cycle) {
                log::error!("cycle {}: iteration failed: {}", cycle, err);
            }

            if cycle % self.config.health_check_cycles == 0 && !self.cancel.is_cancelled() {
                if self.client.revalidate() {
                    log::debug!("cycle {}: session health check passed", cycle);
                } else {
                    log::error!("cycle {}: session health check failed", cycle);
                }
            }

            let remaining = self.config.interval.saturating_sub(started.elapsed());
            self.wait(remaining);
        }

        log::info!("shutdown requested, applying safe speeds");
        self.shutdown();
        Ok(())
    }

    /// Initialization: bounded reachability wait, firmware takeover,
    /// sensor disabling, then best-effort baseline floors.
    pub fn initialize(&mut self) -> Result<()> {
        self.loop_state = LoopState::Initializing;
        log::info!(
            "initializing against {} ({} zone(s))",
            self.client.endpoint(),
            self.zones.len()
        );

        self.await_reachability()?;

        let manual = ActuatorCommand::EnableManualControl;
        if self.client.dialect().supports(&manual) {
            if let Err(err) = self.command(&manual) {
                log::warn!("could not enable manual fan control: {}", err);
            }
        }

        for &id in &self.config.disable_sensors.clone() {
            let cmd = ActuatorCommand::DisableSensor { id };
            if !self.client.dialect().supports(&cmd) {
                log::debug!("dialect {} cannot disable sensors, skipping", self.client.dialect());
                break;
            }
            if let Err(err) = self.command(&cmd) {
                log::warn!("could not disable sensor {}: {}", id, err);
            }
        }

        self.apply_baselines();
        self.loop_state = LoopState::Monitoring;
        log::info!("baseline applied, entering monitoring");
        Ok(())
    }

    /// Bounded polling wait for the actuator endpoint, cancel-aware
    fn await_reachability(&self) -> Result<()> {
        let deadline = Instant::now() + self.config.startup_wait;
        loop {
            if self.cancel.is_cancelled() {
                return Err(AppError::InitializationFatal(
                    "cancelled during startup".to_string(),
                ));
            }
            if self.client.test_connection() {
                log::info!("actuator {} reachable", self.client.endpoint());
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AppError::InitializationFatal(format!(
                    "actuator {} unreachable after {:?}",
                    self.client.endpoint(),
                    self.config.startup_wait
                )));
            }
            log::warn!("actuator {} not reachable yet, waiting", self.client.endpoint());
            let remaining = deadline.saturating_duration_since(Instant::now());
            self.wait(STARTUP_PROBE_INTERVAL.min(remaining));
        }
    }

    /// Baseline: every zone gets its floor speed. Not all-or-nothing;
    /// each failure is logged and the rest proceed.
    fn apply_baselines(&mut self) {
        self.loop_state = LoopState::Baseline;
        for zone in &self.zones.clone() {
            for &target in &zone.targets {
                let cmd = ActuatorCommand::set_floor(target, zone.limits.min);
                if !self.client.dialect().supports(&cmd) {
                    continue;
                }
                if let Err(err) = self.command(&cmd) {
                    log::warn!("zone {}: baseline for {} failed: {}", zone.id, target, err);
                }
            }
        }
    }

    /// One monitoring iteration across all zones
    pub fn tick(&mut self, cycle: u64) -> Result<()> {
        // Read and decide for every zone first, then propagate emergencies,
        // then command — so one zone's emergency can raise its neighbors'
        // speeds within the same cycle.
        let mut decisions: Vec<SafetyDecision> = Vec::with_capacity(self.zones.len());

        for zone in &self.zones {
            let sample = self.reader.read(zone);
            let state = self
                .states
                .get_mut(&zone.id)
                .expect("state exists for every zone");
            state.tick();
            match sample.reading {
                Reading::Valid(temp) => state.record_good_reading(temp),
                Reading::Unavailable => {
                    state.record_unavailable();
                    log::warn!(
                        "cycle {}: zone {}: reading unavailable ({} consecutive)",
                        cycle,
                        zone.id,
                        state.consecutive_read_failures()
                    );
                }
            }

            let decision = self.safety.apply(&self.states[&zone.id], sample.reading, zone);
            log::info!(
                "cycle {}: zone {}: temp={} speed={} emergency={}",
                cycle,
                zone.id,
                sample.reading,
                decision.effective_speed,
                decision.is_emergency()
            );
            decisions.push(decision);
        }

        let decisions = self.propagate_emergencies(cycle, decisions);
        self.loop_state = if decisions.iter().any(|d| d.is_emergency()) {
            LoopState::EmergencyOverride
        } else {
            LoopState::Monitoring
        };

        for (zone, decision) in self.zones.clone().iter().zip(decisions) {
            self.command_zone(cycle, zone, &decision);
        }
        Ok(())
    }

    /// Zones sharing an actuator target with an emergency zone get their
    /// own emergency speed for this cycle.
    fn propagate_emergencies(
        &self,
        cycle: u64,
        mut decisions: Vec<SafetyDecision>,
    ) -> Vec<SafetyDecision> {
        let flagged: Vec<usize> = decisions
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_emergency())
            .map(|(i, _)| i)
            .collect();
        if flagged.is_empty() {
            return decisions;
        }

        for i in 0..self.zones.len() {
            if decisions[i].is_emergency() {
                continue;
            }
            let affected = flagged
                .iter()
                .any(|&j| self.zones[i].shares_target_with(&self.zones[j]));
            if affected {
                log::error!(
                    "cycle {}: zone {}: emergency propagated from shared actuator target",
                    cycle,
                    self.zones[i].id
                );
                decisions[i].effective_speed = self.zones[i].emergency_speed;
                decisions[i].emergency = decisions[flagged[0]].emergency;
            }
        }

        for &i in &flagged {
            log::error!(
                "cycle {}: zone {}: EMERGENCY {:?}, forcing {}",
                cycle,
                self.zones[i].id,
                decisions[i].emergency,
                decisions[i].effective_speed
            );
        }
        decisions
    }

    /// Issue the decided speed for one zone, deduplicating against the
    /// last successfully commanded speed.
    fn command_zone(&mut self, cycle: u64, zone: &ThermalZone, decision: &SafetyDecision) {
        let speed = decision.effective_speed;
        let state = self
            .states
            .get_mut(&zone.id)
            .expect("state exists for every zone");

        if state.last_commanded() == Some(speed) {
            log::debug!("cycle {}: zone {}: speed unchanged at {}, skipping", cycle, zone.id, speed);
            return;
        }

        if self.config.dry_run {
            log::info!("cycle {}: zone {}: DRY RUN, would set {}", cycle, zone.id, speed);
            state.record_command(speed);
            return;
        }

        let mut all_ok = true;
        for &target in &zone.targets {
            let cmd = ActuatorCommand::set_speed(target, speed);
            if let Err(err) = self.client.execute(&cmd) {
                log::error!("cycle {}: zone {}: '{}' failed: {}", cycle, zone.id, cmd, err);
                all_ok = false;
            }
        }

        let state = self
            .states
            .get_mut(&zone.id)
            .expect("state exists for every zone");
        if all_ok {
            state.record_command(speed);
            let sensing_outage = matches!(
                decision.emergency,
                Some(EmergencyReason::SensingLost) | Some(EmergencyReason::FailureStreak(_))
            );
            if sensing_outage {
                // Emergency speed is on; start the failure streak over so
                // recovery is judged afresh
                state.reset_read_failures();
            }
        } else {
            state.record_command_failure();
        }
    }

    /// Best-effort final safe speed for every zone, each command bounded
    /// by the single-attempt timeout.
    pub fn shutdown(&mut self) {
        self.loop_state = LoopState::ShuttingDown;
        for zone in &self.zones {
            let speed = self.config.shutdown_speed;
            if self.config.dry_run {
                log::info!("zone {}: DRY RUN, would set shutdown speed {}", zone.id, speed);
                continue;
            }
            for &target in &zone.targets {
                let cmd = ActuatorCommand::set_speed(target, speed);
                match self.client.execute_once(&cmd) {
                    Ok(_) => log::info!("zone {}: shutdown speed {} applied to {}", zone.id, speed, target),
                    Err(err) => log::error!("zone {}: shutdown command failed: {}", zone.id, err),
                }
            }
        }
    }

    /// Access a zone's cross-cycle state (status reporting, tests)
    pub fn zone_state(&self, id: &str) -> Option<&ZoneState> {
        self.states.get(id)
    }

    fn command(&self, cmd: &ActuatorCommand) -> std::result::Result<String, crate::error::ActuatorError> {
        if self.config.dry_run {
            log::info!("DRY RUN, would execute '{}'", cmd);
            return Ok(String::new());
        }
        self.client.execute(cmd)
    }

    /// Cancel-aware sleep in short slices
    fn wait(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.cancel.is_cancelled() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(WAIT_SLICE));
        }
    }
}
