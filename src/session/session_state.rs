// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the states a control session passes through.
use std::fmt;

/// Lifecycle of a control session.
///
/// A successful session passes through
/// `Disconnected → PositionMode → HomingToStart → Running → Recovering → Returning → Disconnected`.
/// Every exit from `Running` goes through `Recovering` and `Returning`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No connection to the arm.
    Disconnected,
    /// Connected and in position mode.
    PositionMode,
    /// Moving to the home pose before the control loop starts.
    HomingToStart,
    /// Torque mode, control loop running.
    Running,
    /// Switching the arm back to position mode.
    Recovering,
    /// Moving the arm back to the home pose.
    Returning,
}

impl SessionState {
    /// Whether the arm may receive torque commands in this state.
    pub fn is_torque_controlled(&self) -> bool {
        *self == SessionState::Running
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Why the control loop stopped without an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// All configured cycles were run.
    Completed,
    /// The cancel token was triggered.
    Cancelled,
}
