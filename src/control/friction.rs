// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the friction model used to compensate joint friction.
use crate::control::control_tools::apply_deadband;
use crate::control::low_pass_filter::exponential_filter;

/// Velocities below this magnitude in \[rad/s\] are treated as standstill.
pub static DEFAULT_VELOCITY_EPSILON: f64 = 0.01;
/// Reference efforts below this magnitude are treated as zero.
pub static DEFAULT_EFFORT_THRESHOLD: f64 = 0.05;

/// Per-joint parameters of the friction model.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrictionParameters<const N: usize> {
    /// Breakaway torque which has to be overcome to start moving a joint in \[Nm\].
    pub f_brk: [f64; N],
    /// Coulomb friction torque of a moving joint in \[Nm\].
    pub f_coulomb: [f64; N],
    /// Viscous friction coefficient in \[Nm s/rad\].
    pub viscous: [f64; N],
    /// Velocity at which the breakaway torque has decayed to the Coulomb torque in \[rad/s\].
    pub stribeck_velocity: [f64; N],
    /// Velocities with a smaller magnitude are set to zero.
    pub velocity_epsilon: f64,
    /// Reference efforts with a smaller magnitude are set to zero.
    pub effort_threshold: f64,
    /// Decay of the first-order IIR filter applied to consecutive outputs.
    /// `None` disables smoothing.
    pub smoothing: Option<f64>,
}

impl<const N: usize> FrictionParameters<N> {
    /// Creates parameters with the default deadbands and no smoothing.
    pub fn new(
        f_brk: [f64; N],
        f_coulomb: [f64; N],
        viscous: [f64; N],
        stribeck_velocity: [f64; N],
    ) -> Self {
        FrictionParameters {
            f_brk,
            f_coulomb,
            viscous,
            stribeck_velocity,
            velocity_epsilon: DEFAULT_VELOCITY_EPSILON,
            effort_threshold: DEFAULT_EFFORT_THRESHOLD,
            smoothing: None,
        }
    }
    /// Enables smoothing of the output with the given decay.
    ///
    /// # Panics
    /// * if `decay` is outside of \[0, 1).
    pub fn with_smoothing(mut self, decay: f64) -> Self {
        assert!((0. ..1.).contains(&decay));
        self.smoothing = Some(decay);
        self
    }
    /// Overrides the velocity and effort deadbands.
    pub fn with_deadbands(mut self, velocity_epsilon: f64, effort_threshold: f64) -> Self {
        self.velocity_epsilon = velocity_epsilon;
        self.effort_threshold = effort_threshold;
        self
    }
}

/// Estimates the friction torque of every joint so it can be added to a torque command.
///
/// For every joint the velocity `v` and the reference effort `e` first pass their deadbands.
/// Then
/// * `e == 0`: no compensation.
/// * `v == 0`: the breakaway torque in the direction of the effort, `sign(e) * F_brk`.
/// * otherwise: Stribeck, Coulomb and viscous friction in the direction of motion,
/// `sign(v) * (F_c + (F_brk - F_c) * exp(-(v / v_s)²)) + F_v * v`.
///
/// With smoothing enabled the output is `y_k = decay * y_(k-1) + (1 - decay) * raw_k`
/// over consecutive calls of [`generate`](`Self::generate`), starting from zero.
#[derive(Debug, Clone)]
pub struct FrictionEstimator<const N: usize> {
    parameters: FrictionParameters<N>,
    last_estimate: [f64; N],
}

impl<const N: usize> FrictionEstimator<N> {
    pub fn new(parameters: FrictionParameters<N>) -> Self {
        FrictionEstimator {
            parameters,
            last_estimate: [0.; N],
        }
    }

    /// Estimates the friction torque of every joint in \[Nm\].
    ///
    /// # Arguments
    /// * `velocity` - Joint velocities in \[rad/s\].
    /// * `reference_effort` - Signal whose sign decides the direction of the breakaway
    /// compensation, e.g. the position error of the controller.
    pub fn generate(&mut self, velocity: &[f64; N], reference_effort: &[f64; N]) -> [f64; N] {
        let velocity = apply_deadband(velocity, self.parameters.velocity_epsilon);
        let effort = apply_deadband(reference_effort, self.parameters.effort_threshold);
        let mut estimate = [0.; N];
        for i in 0..N {
            let raw = self.joint_friction(i, velocity[i], effort[i]);
            estimate[i] = match self.parameters.smoothing {
                Some(decay) => exponential_filter(decay, raw, self.last_estimate[i]),
                None => raw,
            };
        }
        self.last_estimate = estimate;
        estimate
    }

    fn joint_friction(&self, joint: usize, velocity: f64, effort: f64) -> f64 {
        let f_brk = self.parameters.f_brk[joint];
        if effort == 0. {
            0.
        } else if velocity == 0. {
            effort.signum() * f_brk
        } else {
            let f_c = self.parameters.f_coulomb[joint];
            let stribeck = (velocity / self.parameters.stribeck_velocity[joint]).powi(2);
            velocity.signum() * (f_c + (f_brk - f_c) * (-stribeck).exp())
                + self.parameters.viscous[joint] * velocity
        }
    }

    /// Clears the memory of the smoothing filter.
    pub fn reset(&mut self) {
        self.last_estimate = [0.; N];
    }
    /// The estimate returned by the last [`generate`](`Self::generate`) call.
    pub fn last_estimate(&self) -> &[f64; N] {
        &self.last_estimate
    }
    pub fn parameters(&self) -> &FrictionParameters<N> {
        &self.parameters
    }
}
