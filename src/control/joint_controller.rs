// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the joint space PD controller.
use crate::arm::joint_state::{JointState, Target, TorqueCommand};
use crate::control::control_tools::wrap_angle;
use nalgebra::SVector;
use serde::Deserialize;

/// Proportional and damping gains of the [`JointController`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ControllerGains<const N: usize> {
    /// Proportional gain of every joint in \[Nm/rad\].
    pub kp: [f64; N],
    /// Damping gain of every joint in \[Nm s/rad\].
    pub kv: [f64; N],
}

impl<const N: usize> ControllerGains<N> {
    /// Uses the same gains for every joint.
    pub fn uniform(kp: f64, kv: f64) -> Self {
        ControllerGains {
            kp: [kp; N],
            kv: [kv; N],
        }
    }
    /// Uses individual gains for every joint.
    pub fn per_joint(kp: [f64; N], kv: [f64; N]) -> Self {
        ControllerGains { kp, kv }
    }
}

/// Decides what the [`JointController`] drives the arm towards.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// Track the target position and velocity.
    Tracking,
    /// Ignore the target and only damp the joint velocities. Together with the gravity
    /// compensation of the arm this lets the arm float.
    Floating,
}

/// A joint space PD controller.
///
/// In [`Tracking`](`ControlMode::Tracking`) mode the torque of joint `i` is
/// ```text
/// u_i = kp_i * q_tilde_i + kv_i * (dq_target_i - dq_i)
/// ```
/// with the position error `q_tilde = q_target - q`. In
/// [`Floating`](`ControlMode::Floating`) mode the position error is zero and
/// `u_i = -kv_i * dq_i`.
#[derive(Debug, Clone)]
pub struct JointController<const N: usize> {
    gains: ControllerGains<N>,
    mode: ControlMode,
    wrap_position_error: bool,
    q_tilde: [f64; N],
}

impl<const N: usize> JointController<N> {
    /// Creates a controller which tracks a target.
    pub fn tracking(gains: ControllerGains<N>) -> Self {
        JointController::new(gains, ControlMode::Tracking)
    }
    /// Creates a controller which only damps the arm.
    pub fn floating(gains: ControllerGains<N>) -> Self {
        JointController::new(gains, ControlMode::Floating)
    }
    /// Creates a new controller. The position error is wrapped into \[-π, π)
    /// unless disabled with [`wrap_position_error`](`Self::wrap_position_error`).
    pub fn new(gains: ControllerGains<N>, mode: ControlMode) -> Self {
        JointController {
            gains,
            mode,
            wrap_position_error: true,
            q_tilde: [0.; N],
        }
    }
    /// Enables or disables wrapping of the position error into \[-π, π).
    pub fn wrap_position_error(mut self, wrap: bool) -> Self {
        self.wrap_position_error = wrap;
        self
    }
    /// Computes the torque driving the arm from `current` towards `target`.
    ///
    /// The target is ignored in [`Floating`](`ControlMode::Floating`) mode.
    pub fn control(&mut self, current: &JointState<N>, target: &Target<N>) -> TorqueCommand<N> {
        let kp = SVector::<f64, N>::from(self.gains.kp);
        let kv = SVector::<f64, N>::from(self.gains.kv);
        let dq = SVector::<f64, N>::from(current.dq);
        let (q_tilde, dq_target) = match self.mode {
            ControlMode::Tracking => {
                let mut q_tilde =
                    SVector::<f64, N>::from(target.q) - SVector::<f64, N>::from(current.q);
                if self.wrap_position_error {
                    q_tilde.apply(|x| *x = wrap_angle(*x));
                }
                (q_tilde, SVector::<f64, N>::from(target.velocity()))
            }
            ControlMode::Floating => (SVector::zeros(), SVector::zeros()),
        };
        self.q_tilde = q_tilde.into();
        let u = kp.component_mul(&q_tilde) + kv.component_mul(&(dq_target - dq));
        TorqueCommand::from(u)
    }
    /// Position error of the last [`control`](`Self::control`) call in \[rad\].
    pub fn q_tilde(&self) -> &[f64; N] {
        &self.q_tilde
    }
    /// Gains the controller was created with.
    pub fn gains(&self) -> &ControllerGains<N> {
        &self.gains
    }
    /// Whether the controller tracks a target or floats.
    pub fn mode(&self) -> ControlMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use crate::arm::joint_state::{JointState, Target};
    use crate::control::joint_controller::{ControllerGains, JointController};

    fn state() -> JointState<6> {
        JointState::new([0.1, 2.5, 3.0, 1.2, 0.8, 0.4], [0.2, -0.1, 0.0, 0.05, -0.3, 0.01])
    }

    #[test]
    fn zero_gains_give_zero_torque() {
        let mut controller = JointController::tracking(ControllerGains::uniform(0., 0.));
        let target = Target::with_velocity([2.0, 2.75, 3.45, 1.0, 0.85, 0.5], [1.; 6]);
        let command = controller.control(&state(), &target);
        command.tau.iter().for_each(|&x| assert_eq!(x, 0.));
        let mut floating = JointController::floating(ControllerGains::uniform(0., 0.));
        assert_eq!(floating.control(&state(), &target).tau, [0.; 6]);
    }

    #[test]
    fn pd_law_per_joint() {
        let mut controller = JointController::tracking(ControllerGains::uniform(10., 3.3));
        let target = Target::position([2.0, 2.75, 3.45, 1.0, 0.85, 0.5]);
        let current = state();
        let command = controller.control(&current, &target);
        for i in 0..6 {
            let expected = 10. * (target.q[i] - current.q[i]) - 3.3 * current.dq[i];
            assert!((command.tau[i] - expected).abs() < 1e-12);
            assert!((controller.q_tilde()[i] - (target.q[i] - current.q[i])).abs() < 1e-12);
        }
    }

    #[test]
    fn target_velocity_is_tracked() {
        let gains = ControllerGains::per_joint([0.; 2], [2., 4.]);
        let mut controller = JointController::tracking(gains);
        let current = JointState::new([0.; 2], [0.5, -0.5]);
        let command = controller.control(&current, &Target::with_velocity([0.; 2], [1., 1.]));
        assert!((command.tau[0] - 1.).abs() < 1e-12);
        assert!((command.tau[1] - 6.).abs() < 1e-12);
    }

    #[test]
    fn position_error_is_wrapped() {
        let mut controller = JointController::tracking(ControllerGains::uniform(1., 0.));
        let current = JointState::at_rest([6.0]);
        let command = controller.control(&current, &Target::position([0.2]));
        let expected = 0.2 - 6.0 + 2. * std::f64::consts::PI;
        assert!((command.tau[0] - expected).abs() < 1e-12);

        let mut unwrapped = JointController::tracking(ControllerGains::uniform(1., 0.))
            .wrap_position_error(false);
        let command = unwrapped.control(&current, &Target::position([0.2]));
        assert!((command.tau[0] - (0.2 - 6.0)).abs() < 1e-12);
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let mut controller = JointController::tracking(ControllerGains::uniform(10., 3.3));
        let target = Target::position([2.0, 2.75, 3.45, 1.0, 0.85, 0.5]);
        let first = controller.control(&state(), &target);
        let first_error = *controller.q_tilde();
        let second = controller.control(&state(), &target);
        assert_eq!(first, second);
        assert_eq!(&first_error, controller.q_tilde());
    }

    #[test]
    fn floating_only_damps() {
        let mut controller = JointController::floating(ControllerGains::uniform(10., 3.3));
        let current = state();
        let command = controller.control(&current, &Target::position([5.; 6]));
        for i in 0..6 {
            assert!((command.tau[i] + 3.3 * current.dq[i]).abs() < 1e-12);
        }
        assert_eq!(controller.q_tilde(), &[0.; 6]);
    }

    #[test]
    fn target_equal_to_state_gives_zero_torque() {
        let mut controller = JointController::tracking(ControllerGains::uniform(10., 3.3));
        let current = state();
        let command = controller.control(&current, &Target::from(&current));
        assert_eq!(command.tau, [0.; 6]);
        assert_eq!(controller.q_tilde(), &[0.; 6]);
    }
}
