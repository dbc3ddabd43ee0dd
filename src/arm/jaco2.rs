// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Constants describing a 6-DOF Kinova Jaco2 arm.

/// Number of actuated joints of the arm (without the hand).
pub const JACO2_DOF: usize = 6;

/// Safe resting pose the arm is returned to at the end of every session in \[rad\].
/// Corresponds to \[250°, 140°, 100°, 230°, 40°, 0°\].
pub static HOME_POSITION: [f64; JACO2_DOF] = [
    4.363323129985824,
    2.443460952792061,
    1.7453292519943295,
    4.014257279586958,
    0.6981317007977318,
    0.0,
];

/// Pose used to read the torque offsets before switching to torque mode in \[rad\].
/// Corresponds to \[0°, 140°, 180°, 0°, 0°, 0°\].
pub static INIT_TORQUE_POSITION: [f64; JACO2_DOF] = [
    0.0,
    2.443460952792061,
    std::f64::consts::PI,
    0.0,
    0.0,
    0.0,
];

/// Target used by the friction compensation session in \[rad\].
pub static FRICTION_TEST_TARGET: [f64; JACO2_DOF] = [2.0, 2.75, 3.45, 1.0, 0.85, 0.5];

/// Peak torque of the actuators in \[Nm\]. Joints 1-3 are the big KA-75+ actuators,
/// joints 4-6 the small KA-58 actuators.
pub static MAX_TORQUE: [f64; JACO2_DOF] = [30.5, 30.5, 30.5, 6.8, 6.8, 6.8];

/// Breakaway friction torque of every joint in \[Nm\].
pub static F_BRK: [f64; JACO2_DOF] = [1.25, 1.75, 0.75, 0.35, 0.35, 0.35];

/// Coulomb friction torque of every joint in \[Nm\].
pub static F_COULOMB: [f64; JACO2_DOF] = [1.0, 1.4, 0.6, 0.25, 0.25, 0.25];

/// Viscous friction coefficient of every joint in \[Nm s/rad\].
pub static VISCOUS_FRICTION: [f64; JACO2_DOF] = [0.4, 0.5, 0.3, 0.1, 0.1, 0.1];

/// Velocity at which the Stribeck effect has decayed in \[rad/s\].
pub static STRIBECK_VELOCITY: [f64; JACO2_DOF] = [0.1; JACO2_DOF];
