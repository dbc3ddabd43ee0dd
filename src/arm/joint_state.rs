// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the per-cycle joint state, target and torque command types.
use nalgebra::SVector;

/// Snapshot of the joint positions and velocities read from the arm in one control cycle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct JointState<const N: usize> {
    /// Measured joint positions in \[rad\].
    pub q: [f64; N],
    /// Measured joint velocities in \[rad/s\].
    pub dq: [f64; N],
}

impl<const N: usize> JointState<N> {
    /// Creates a new JointState instance.
    /// # Arguments
    /// * `q` - Joint positions in \[rad\].
    /// * `dq` - Joint velocities in \[rad/s\].
    pub fn new(q: [f64; N], dq: [f64; N]) -> Self {
        JointState { q, dq }
    }
    /// A joint state with every joint resting at the given positions.
    pub fn at_rest(q: [f64; N]) -> Self {
        JointState { q, dq: [0.; N] }
    }
}

impl<const N: usize> Default for JointState<N> {
    fn default() -> Self {
        JointState::at_rest([0.; N])
    }
}

/// Desired joint configuration for the joint controller.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Target<const N: usize> {
    /// Desired joint positions in \[rad\].
    pub q: [f64; N],
    /// Desired joint velocities in \[rad/s\]. `None` is treated as zero velocity.
    pub dq: Option<[f64; N]>,
}

impl<const N: usize> Target<N> {
    /// Creates a target that should be held still at `q`.
    pub fn position(q: [f64; N]) -> Self {
        Target { q, dq: None }
    }
    /// Creates a target which moves through `q` with velocity `dq`.
    pub fn with_velocity(q: [f64; N], dq: [f64; N]) -> Self {
        Target { q, dq: Some(dq) }
    }
    /// Desired velocity with a missing velocity replaced by zeros.
    pub fn velocity(&self) -> [f64; N] {
        self.dq.unwrap_or([0.; N])
    }
}

impl<const N: usize> From<&JointState<N>> for Target<N> {
    fn from(state: &JointState<N>) -> Self {
        Target::with_velocity(state.q, state.dq)
    }
}

/// Joint-level torque command sent to the arm in one control cycle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TorqueCommand<const N: usize> {
    /// Commanded torques in \[Nm\].
    pub tau: [f64; N],
}

impl<const N: usize> From<SVector<f64, N>> for TorqueCommand<N> {
    fn from(vector: SVector<f64, N>) -> Self {
        TorqueCommand::new(vector.into())
    }
}

impl<const N: usize> TorqueCommand<N> {
    /// Creates a new TorqueCommand instance
    /// # Arguments
    /// * `torques` - Desired joint-level torques in \[Nm\].
    pub fn new(torques: [f64; N]) -> Self {
        TorqueCommand { tau: torques }
    }
    /// A command which applies no torque on any joint.
    pub fn zeros() -> Self {
        TorqueCommand { tau: [0.; N] }
    }
    /// Returns a copy where the torque of joint `i` is limited to `[-u_max[i], u_max[i]]`.
    ///
    /// # Panics
    /// * if any limit is negative or NaN.
    pub fn clamped(&self, u_max: &[f64; N]) -> Self {
        let mut tau = self.tau;
        tau.iter_mut().zip(u_max.iter()).for_each(|(x, &limit)| {
            assert!(limit >= 0.);
            *x = x.clamp(-limit, limit)
        });
        TorqueCommand { tau }
    }
    /// Element-wise sum of the command and an additional torque.
    pub fn with_added(&self, torques: &[f64; N]) -> Self {
        let mut tau = self.tau;
        tau.iter_mut()
            .zip(torques.iter())
            .for_each(|(x, y)| *x += *y);
        TorqueCommand { tau }
    }
    /// Largest absolute torque of the command.
    pub fn max_abs(&self) -> f64 {
        self.tau.iter().fold(0., |acc: f64, x| acc.max(x.abs()))
    }
}

#[cfg(test)]
mod tests {
    use crate::arm::joint_state::{Target, TorqueCommand};

    #[test]
    fn clamp_limits_every_joint() {
        let command = TorqueCommand::new([-30., 2., 12.5, -12.5, 0., 100.]);
        let clamped = command.clamped(&[12.; 6]);
        assert_eq!(clamped.tau, [-12., 2., 12., -12., 0., 12.]);
        assert!(clamped.max_abs() <= 12.);
        let clamped = command.clamped(&[5., 1., 20., 20., 1., 6.8]);
        assert_eq!(clamped.tau, [-5., 1., 12.5, -12.5, 0., 6.8]);
    }

    #[test]
    fn missing_target_velocity_is_zero() {
        let target = Target::position([1.; 6]);
        assert_eq!(target.velocity(), [0.; 6]);
        let target = Target::with_velocity([1.; 6], [0.5; 6]);
        assert_eq!(target.velocity(), [0.5; 6]);
    }

    #[test]
    fn with_added_is_elementwise() {
        let command = TorqueCommand::new([1., 2., 3.]).with_added(&[0.5, -2., 1.]);
        assert_eq!(command.tau, [1.5, 0., 4.]);
    }
}
