// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the supervisor which runs a torque control session on an arm.
use std::time::Instant;

use log::{debug, error, info, trace, warn};
use serde::Deserialize;

use crate::arm::arm_interface::{ArmInterface, ArmMode};
use crate::arm::joint_state::{JointState, Target, TorqueCommand};
use crate::control::control_tools::{apply_deadband, prepare_loop_thread, RealtimeConfig};
use crate::control::friction::{FrictionEstimator, DEFAULT_VELOCITY_EPSILON};
use crate::control::joint_controller::JointController;
use crate::exception::{
    create_command_exception, create_read_exception, JacoException, JacoResult,
};
use crate::session::cancel::CancelToken;
use crate::session::safe_return::{Recover, SafeReturn};
use crate::session::session_state::{LoopExit, SessionState};
use crate::telemetry::logger::TelemetrySample;
use crate::telemetry::record::TelemetryRecord;
use crate::telemetry::{SessionMetadata, TelemetrySink};

/// Signal passed to the friction estimator as reference effort.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortSource {
    /// The position error `q_tilde` of the joint controller.
    PositionError,
    /// The torque computed by the joint controller, before friction is added.
    CommandTorque,
}

/// Settings of a control session.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SupervisorConfig<const N: usize> {
    /// Number of control cycles to run.
    pub loop_limit: usize,
    /// Torque limit of every joint in \[Nm\]. Every command is clamped to `[-u_max, u_max]`.
    pub u_max: [f64; N],
    /// Pose the arm is moved to before and after the control loop in \[rad\].
    pub home_position: [f64; N],
    /// Measured velocities below this magnitude in \[rad/s\] are set to zero before control.
    pub velocity_deadband: f64,
    /// Controller torques below this magnitude in \[Nm\] are set to zero before friction is added.
    pub torque_deadband: f64,
    /// Signal used as reference effort of the friction estimator.
    pub effort_source: EffortSource,
    /// Whether the loop thread gets realtime priority.
    pub realtime: RealtimeConfig,
    /// Whether the torque load is read once at the home pose before switching to torque mode.
    pub read_initial_torque_load: bool,
}

impl<const N: usize> SupervisorConfig<N> {
    /// Creates a configuration with the deadbands of the friction compensation session.
    pub fn new(loop_limit: usize, u_max: [f64; N], home_position: [f64; N]) -> Self {
        SupervisorConfig {
            loop_limit,
            u_max,
            home_position,
            velocity_deadband: DEFAULT_VELOCITY_EPSILON,
            torque_deadband: 0.01,
            effort_source: EffortSource::PositionError,
            realtime: RealtimeConfig::Ignore,
            read_initial_torque_load: false,
        }
    }
}

/// Summary of a finished control session.
#[derive(Debug, Clone)]
pub struct SessionReport<const N: usize> {
    /// Number of completed control cycles.
    pub cycles: usize,
    pub exit: LoopExit,
    /// Number of position commands which did not settle in time.
    pub homing_timeouts: usize,
    /// Torque load read at the home pose, if requested.
    pub initial_torque_load: Option<[f64; N]>,
    /// Telemetry of the session.
    pub record: TelemetryRecord,
}

/// Runs a torque control session on an arm.
///
/// [`run`](`Self::run`) connects to the arm, switches it into position mode, moves it to
/// the home pose, switches to torque mode and runs the control loop for
/// [`loop_limit`](`SupervisorConfig::loop_limit`) cycles. Every cycle reads the feedback,
/// computes the controller torque, adds the friction compensation, clamps the sum and
/// sends it. However the loop ends, the arm is switched back into position mode, moved
/// home and disconnected before `run` returns.
pub struct Supervisor<const N: usize, A: ArmInterface<N>> {
    arm: A,
    controller: JointController<N>,
    friction: Option<FrictionEstimator<N>>,
    target: Target<N>,
    config: SupervisorConfig<N>,
    cancel: CancelToken,
    state: SessionState,
    history: Vec<SessionState>,
    homing_timeouts: usize,
    initial_torque_load: Option<[f64; N]>,
}

impl<const N: usize, A: ArmInterface<N>> Supervisor<N, A> {
    /// Creates a supervisor without friction compensation which holds the home pose.
    pub fn new(arm: A, controller: JointController<N>, config: SupervisorConfig<N>) -> Self {
        Supervisor {
            arm,
            controller,
            friction: None,
            target: Target::position(config.home_position),
            config,
            cancel: CancelToken::new(),
            state: SessionState::Disconnected,
            history: vec![SessionState::Disconnected],
            homing_timeouts: 0,
            initial_torque_load: None,
        }
    }
    /// Adds friction compensation to every torque command.
    pub fn with_friction(mut self, friction: FrictionEstimator<N>) -> Self {
        self.friction = Some(friction);
        self
    }
    pub fn with_target(mut self, target: Target<N>) -> Self {
        self.target = target;
        self
    }
    /// Uses `token` to stop the control loop early.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }
    /// Token which stops the control loop of this supervisor.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
    /// Current state of the session.
    pub fn state(&self) -> SessionState {
        self.state
    }
    /// States the last session passed through, in order.
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }
    pub fn arm(&self) -> &A {
        &self.arm
    }
    pub fn into_arm(self) -> A {
        self.arm
    }
    pub fn config(&self) -> &SupervisorConfig<N> {
        &self.config
    }

    /// Values stored next to the per-cycle telemetry.
    pub fn session_metadata(&self) -> SessionMetadata<N> {
        let f_brk = self
            .friction
            .as_ref()
            .map(|x| x.parameters().f_brk)
            .unwrap_or([0.; N]);
        SessionMetadata::new(*self.controller.gains(), self.target.q, f_brk)
    }

    /// Runs one complete session and flushes its telemetry into `sink`.
    ///
    /// `sink` is asked to [`reserve`](`TelemetrySink::reserve`) room for
    /// [`loop_limit`](`SupervisorConfig::loop_limit`) samples before the arm is connected.
    /// If the flush fails, the samples stay in `sink` and the flush can be retried.
    ///
    /// # Errors
    /// * RealTimeException if realtime priority was requested but cannot be set. The arm
    /// is not touched in this case.
    /// * ConnectionError if the arm cannot be reached. The arm is not commanded.
    /// * Any error of the arm while preparing or running the control loop. It is
    /// returned after the arm has been returned home and disconnected.
    /// * The first error of the recovery if the control loop itself succeeded.
    /// * TelemetryError if the telemetry could not be flushed.
    pub fn run<S: TelemetrySink<N>>(&mut self, sink: &mut S) -> JacoResult<SessionReport<N>> {
        prepare_loop_thread(self.config.realtime)?;
        sink.reserve(self.config.loop_limit);
        self.history = vec![SessionState::Disconnected];
        self.state = SessionState::Disconnected;
        self.homing_timeouts = 0;
        self.initial_torque_load = None;
        if let Some(estimator) = self.friction.as_mut() {
            estimator.reset();
        }

        if let Err(e) = self.arm.connect() {
            error!("connecting to the arm failed: {}", e);
            return Err(e);
        }
        info!("connected to the arm");

        let mut guard = SafeReturn::new(&mut *self);
        let outcome = guard.start_and_run(sink);
        let cleanup = guard.finish();
        let record = sink.flush(&self.session_metadata());

        let (cycles, exit) = match outcome {
            Ok(result) => result,
            Err(e) => {
                error!("session aborted: {}", e);
                if let Err(cleanup_error) = cleanup {
                    error!("returning the arm failed as well: {}", cleanup_error);
                }
                if let Err(record_error) = record {
                    error!("telemetry of the aborted session is lost: {}", record_error);
                }
                return Err(e);
            }
        };
        cleanup?;
        let record = record?;
        info!("session finished after {} cycles ({:?})", cycles, exit);
        Ok(SessionReport {
            cycles,
            exit,
            homing_timeouts: self.homing_timeouts,
            initial_torque_load: self.initial_torque_load,
            record,
        })
    }

    fn transition(&mut self, state: SessionState) {
        debug!("session state {} -> {}", self.state, state);
        self.state = state;
        self.history.push(state);
    }

    /// Moves the arm home. A timeout is counted and logged but not returned.
    fn move_home(&mut self) -> JacoResult<()> {
        match self.arm.command_position(&self.config.home_position) {
            Err(JacoException::HomingTimeout { timeout_s }) => {
                warn!("arm did not settle at the home pose within {} s", timeout_s);
                self.homing_timeouts += 1;
                Ok(())
            }
            other => other,
        }
    }

    fn start_and_run<S: TelemetrySink<N>>(
        &mut self,
        sink: &mut S,
    ) -> JacoResult<(usize, LoopExit)> {
        self.arm.set_mode(ArmMode::Position)?;
        self.transition(SessionState::PositionMode);
        self.transition(SessionState::HomingToStart);
        self.move_home()?;
        if self.config.read_initial_torque_load {
            let load = self.arm.read_torque_load()?;
            info!("torque load at the home pose: {:?}", load);
            self.initial_torque_load = Some(load);
        }
        self.arm.set_mode(ArmMode::Torque)?;
        self.transition(SessionState::Running);
        self.control_loop(sink)
    }

    fn control_loop<S: TelemetrySink<N>>(
        &mut self,
        sink: &mut S,
    ) -> JacoResult<(usize, LoopExit)> {
        debug_assert!(self.state.is_torque_controlled());
        let start = Instant::now();
        for cycle in 0..self.config.loop_limit {
            if self.cancel.is_cancelled() {
                info!("control loop cancelled after {} cycles", cycle);
                return Ok((cycle, LoopExit::Cancelled));
            }
            let mut state = self.arm.read_feedback()?;
            if state.q.iter().chain(state.dq.iter()).any(|x| !x.is_finite()) {
                return Err(create_read_exception("feedback is not finite"));
            }
            state.dq = apply_deadband(&state.dq, self.config.velocity_deadband);
            let torque_load = self.arm.read_torque_load()?;
            let (command, friction) = self.compute_command(&state);
            if command.tau.iter().any(|x| !x.is_finite()) {
                return Err(create_command_exception("computed torque is not finite"));
            }
            self.arm.command_torque(&command)?;
            trace!("cycle {}: tau = {:?}", cycle, command.tau);
            sink.append(TelemetrySample {
                cycle,
                time: start.elapsed(),
                state,
                command,
                torque_load,
                friction,
            });
        }
        Ok((self.config.loop_limit, LoopExit::Completed))
    }

    /// Computes the clamped torque command of one cycle and the friction compensation in it.
    fn compute_command(&mut self, state: &JointState<N>) -> (TorqueCommand<N>, [f64; N]) {
        let base = self.controller.control(state, &self.target);
        let base = TorqueCommand::new(apply_deadband(&base.tau, self.config.torque_deadband));
        let friction = match self.friction.as_mut() {
            Some(estimator) => {
                let effort = match self.config.effort_source {
                    EffortSource::PositionError => *self.controller.q_tilde(),
                    EffortSource::CommandTorque => base.tau,
                };
                estimator.generate(&state.dq, &effort)
            }
            None => [0.; N],
        };
        (base.with_added(&friction).clamped(&self.config.u_max), friction)
    }
}

impl<const N: usize, A: ArmInterface<N>> Recover for Supervisor<N, A> {
    fn recover(&mut self) -> JacoResult<()> {
        self.transition(SessionState::Recovering);
        let mode = self.arm.set_mode(ArmMode::Position);
        if let Err(e) = &mode {
            error!("switching back to position mode failed: {}", e);
        }
        self.transition(SessionState::Returning);
        let home = self.move_home();
        if let Err(e) = &home {
            error!("returning to the home pose failed: {}", e);
        }
        let disconnect = self.arm.disconnect();
        if let Err(e) = &disconnect {
            error!("disconnecting failed: {}", e);
        }
        self.transition(SessionState::Disconnected);
        info!("arm returned home and disconnected");
        mode.and(home).and(disconnect)
    }
}
