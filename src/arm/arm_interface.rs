// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the ArmInterface trait through which the supervisor talks to an arm.
use crate::arm::joint_state::{JointState, TorqueCommand};
use crate::exception::JacoResult;

/// Control modes an arm can be switched into.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArmMode {
    /// The arm follows position commands with its own internal controller.
    Position,
    /// The arm applies the joint torques sent by the control loop.
    Torque,
}

/// Capabilities a manipulator has to provide so it can be driven by a
/// [`Supervisor`](`crate::session::supervisor::Supervisor`).
///
/// `N` is the number of actuated joints.
pub trait ArmInterface<const N: usize> {
    /// Establishes the connection to the arm.
    /// # Errors
    /// * [`ConnectionError`](`crate::exception::JacoException::ConnectionError`) if the arm cannot be reached.
    fn connect(&mut self) -> JacoResult<()>;
    /// Releases the arm. Must succeed if the arm is already disconnected.
    fn disconnect(&mut self) -> JacoResult<()>;
    /// Switches the arm into position or torque mode.
    /// # Errors
    /// * [`ModeError`](`crate::exception::JacoException::ModeError`) if the arm refuses the switch.
    fn set_mode(&mut self, mode: ArmMode) -> JacoResult<()>;
    /// Moves the arm to the given joint positions and blocks until the arm has settled.
    /// # Errors
    /// * [`HomingTimeout`](`crate::exception::JacoException::HomingTimeout`) if the arm did not settle in time.
    /// * [`CommandError`](`crate::exception::JacoException::CommandError`) if the command was rejected.
    fn command_position(&mut self, q: &[f64; N]) -> JacoResult<()>;
    /// Sends one torque command. Does not wait for the arm to react.
    /// # Errors
    /// * [`CommandError`](`crate::exception::JacoException::CommandError`) if the command was rejected.
    fn command_torque(&mut self, command: &TorqueCommand<N>) -> JacoResult<()>;
    /// Reads the current joint positions and velocities.
    /// # Errors
    /// * [`ReadError`](`crate::exception::JacoException::ReadError`) if no feedback could be read.
    fn read_feedback(&mut self) -> JacoResult<JointState<N>>;
    /// Reads the torque load measured in every joint in \[Nm\].
    /// # Errors
    /// * [`ReadError`](`crate::exception::JacoException::ReadError`) if no feedback could be read.
    fn read_torque_load(&mut self) -> JacoResult<[f64; N]>;
}

impl<const N: usize, A: ArmInterface<N> + ?Sized> ArmInterface<N> for &mut A {
    fn connect(&mut self) -> JacoResult<()> {
        (**self).connect()
    }
    fn disconnect(&mut self) -> JacoResult<()> {
        (**self).disconnect()
    }
    fn set_mode(&mut self, mode: ArmMode) -> JacoResult<()> {
        (**self).set_mode(mode)
    }
    fn command_position(&mut self, q: &[f64; N]) -> JacoResult<()> {
        (**self).command_position(q)
    }
    fn command_torque(&mut self, command: &TorqueCommand<N>) -> JacoResult<()> {
        (**self).command_torque(command)
    }
    fn read_feedback(&mut self) -> JacoResult<JointState<N>> {
        (**self).read_feedback()
    }
    fn read_torque_load(&mut self) -> JacoResult<[f64; N]> {
        (**self).read_torque_load()
    }
}
