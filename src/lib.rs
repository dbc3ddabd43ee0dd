// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! # jaco2-control
//! jaco2-control runs joint torque control sessions with friction compensation on
//! [Kinova Jaco2](https://www.kinovarobotics.com) arms.
//!
//! **ALWAYS HAVE THE EMERGENCY STOP AT
//! HAND WHILE CONTROLLING THE ARM!**
//!
//!
//! ## Design
//! A session connects to the arm, moves it in position mode to its home pose, switches to
//! torque mode and runs a control loop for a fixed number of cycles. However the loop ends,
//! the arm is switched back to position mode, moved home and disconnected before the
//! session returns.
//!
//! The library is divided into these modules:
//! * [arm](`crate::arm`) - the [`ArmInterface`] a session drives, the per-cycle joint types,
//! the Jaco2 constants and a [`SimulatedArm`].
//! * [control](`crate::control`) - the [`JointController`] and the [`FrictionEstimator`].
//! * [session](`crate::session`) - the [`Supervisor`] which runs a session.
//! * [telemetry](`crate::telemetry`) - recording and storing what happened in a session.
//! * [config](`crate::config`) - loading a session from a TOML file.
//!
//! # Example:
//!```no_run
//! use jaco::{JacoResult, SessionConfig, SimulatedArm, Supervisor, JACO2_DOF};
//! fn main() -> JacoResult<()> {
//!     let config = SessionConfig::load("friction_compensation.toml")?;
//!     let mut supervisor: Supervisor<JACO2_DOF, _> = Supervisor::new(
//!         SimulatedArm::jaco2(),
//!         config.controller()?,
//!         config.supervisor_config()?,
//!     )
//!     .with_target(config.target()?);
//!     if let Some(friction) = config.friction_estimator()? {
//!         supervisor = supervisor.with_friction(friction);
//!     }
//!     let mut sink = config.telemetry_buffer::<JACO2_DOF>();
//!     let report = supervisor.run(&mut sink)?;
//!     println!("ran {} cycles", report.cycles);
//!     Ok(())
//! }
//! ```
//!
//! [`run`](`Supervisor::run`) returns a JacoResult which means that it returns either the
//! [`SessionReport`] or an Error of type [`JacoException`]. An error is only returned after
//! the arm has been released, except for a connection error in which case the arm was never
//! commanded.
//!
//! To stop a running session from another thread, e.g. a Ctrl-C handler, pass a
//! [`CancelToken`] with [`with_cancel_token`](`Supervisor::with_cancel_token`) and call
//! [`cancel`](`CancelToken::cancel`). The loop stops at the next cycle boundary and the
//! session ends like a completed one.
pub mod arm;
pub mod config;
pub mod control;
pub mod exception;
pub mod session;
pub mod telemetry;

pub use arm::arm_interface::{ArmInterface, ArmMode};
pub use arm::jaco2::JACO2_DOF;
pub use arm::joint_state::{JointState, Target, TorqueCommand};
pub use arm::simulated_arm::SimulatedArm;
pub use config::SessionConfig;
pub use control::control_tools::RealtimeConfig;
pub use control::friction::{FrictionEstimator, FrictionParameters};
pub use control::joint_controller::{ControlMode, ControllerGains, JointController};
pub use exception::{JacoException, JacoResult};
pub use session::cancel::CancelToken;
pub use session::session_state::{LoopExit, SessionState};
pub use session::supervisor::{EffortSource, SessionReport, Supervisor, SupervisorConfig};
pub use telemetry::archive::TelemetryArchive;
pub use telemetry::logger::{TelemetryBuffer, TelemetrySample};
pub use telemetry::record::TelemetryRecord;
pub use telemetry::TelemetrySink;
