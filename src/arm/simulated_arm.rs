// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains a simulated arm which can stand in for the hardware.
use crate::arm::arm_interface::{ArmInterface, ArmMode};
use crate::arm::jaco2::{HOME_POSITION, JACO2_DOF};
use crate::arm::joint_state::{JointState, TorqueCommand};
use crate::exception::{create_command_exception, create_read_exception, JacoException, JacoResult};
use log::{debug, trace};

/// Integration step of the simulation in \[s\]. Every torque command advances the
/// simulation by one step.
pub static SIMULATION_TIME_STEP: f64 = 1e-3;

/// A rigid, gravity compensated arm whose joints are decoupled inertias with
/// Coulomb and viscous friction.
///
/// Position commands settle instantly, torque commands advance the simulation by
/// [`SIMULATION_TIME_STEP`]. The measured torque load is the commanded torque minus
/// the friction torque of the joint.
#[derive(Debug, Clone)]
pub struct SimulatedArm<const N: usize> {
    connected: bool,
    mode: ArmMode,
    state: JointState<N>,
    torque_load: [f64; N],
    inertia: [f64; N],
    viscous_friction: [f64; N],
    coulomb_friction: [f64; N],
    settles: bool,
    reachable: bool,
}

impl SimulatedArm<JACO2_DOF> {
    /// Creates a simulated Jaco2 resting at its home position.
    pub fn jaco2() -> Self {
        SimulatedArm::new(HOME_POSITION)
            .with_inertia([0.6, 0.8, 0.4, 0.08, 0.08, 0.05])
            .with_friction([0.4, 0.5, 0.3, 0.1, 0.1, 0.1], [1.0, 1.4, 0.6, 0.25, 0.25, 0.25])
    }
}

impl<const N: usize> SimulatedArm<N> {
    /// Creates a simulated arm with unit inertia and no friction resting at `q`.
    pub fn new(q: [f64; N]) -> Self {
        SimulatedArm {
            connected: false,
            mode: ArmMode::Position,
            state: JointState::at_rest(q),
            torque_load: [0.; N],
            inertia: [1.; N],
            viscous_friction: [0.; N],
            coulomb_friction: [0.; N],
            settles: true,
            reachable: true,
        }
    }
    /// Sets the inertia of every joint in \[kg m²\].
    pub fn with_inertia(mut self, inertia: [f64; N]) -> Self {
        self.inertia = inertia;
        self
    }
    /// Set viscous \[Nm s/rad\] and Coulomb \[Nm\] friction of every joint.
    pub fn with_friction(mut self, viscous: [f64; N], coulomb: [f64; N]) -> Self {
        self.viscous_friction = viscous;
        self.coulomb_friction = coulomb;
        self
    }
    /// Lets every position command time out instead of settling.
    pub fn never_settling(mut self) -> Self {
        self.settles = false;
        self
    }
    /// Lets every connection attempt fail.
    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }
    /// Whether the simulated connection is open.
    pub fn is_connected(&self) -> bool {
        self.connected
    }
    /// The mode the arm is currently in.
    pub fn mode(&self) -> ArmMode {
        self.mode
    }
    /// The current simulated joint state.
    pub fn state(&self) -> JointState<N> {
        self.state
    }

    fn friction_torque(&self, joint: usize) -> f64 {
        let dq = self.state.dq[joint];
        let coulomb = if dq.abs() > 1e-6 {
            self.coulomb_friction[joint] * dq.signum()
        } else {
            0.
        };
        self.viscous_friction[joint] * dq + coulomb
    }

    fn step(&mut self, tau: &[f64; N]) {
        for i in 0..N {
            let friction = self.friction_torque(i);
            // Coulomb friction holds a resting joint until it is overcome
            let net = if self.state.dq[i] == 0. && tau[i].abs() <= self.coulomb_friction[i] {
                0.
            } else {
                tau[i] - friction
            };
            let ddq = net / self.inertia[i];
            let dq_next = self.state.dq[i] + ddq * SIMULATION_TIME_STEP;
            // friction can stop a joint but never reverse it
            self.state.dq[i] = if self.state.dq[i] != 0.
                && dq_next.signum() != self.state.dq[i].signum()
                && tau[i].abs() <= self.coulomb_friction[i]
            {
                0.
            } else {
                dq_next
            };
            self.state.q[i] += self.state.dq[i] * SIMULATION_TIME_STEP;
            self.torque_load[i] = tau[i] - friction;
        }
    }

    fn ensure_connected(&self) -> JacoResult<()> {
        if self.connected {
            Ok(())
        } else {
            Err(JacoException::ConnectionError {
                message: "simulated arm is not connected".to_string(),
            })
        }
    }
}

impl<const N: usize> ArmInterface<N> for SimulatedArm<N> {
    fn connect(&mut self) -> JacoResult<()> {
        if !self.reachable {
            return Err(JacoException::ConnectionError {
                message: "simulated arm is unreachable".to_string(),
            });
        }
        debug!("simulated arm connected");
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> JacoResult<()> {
        if self.connected {
            debug!("simulated arm disconnected");
        }
        self.connected = false;
        Ok(())
    }

    fn set_mode(&mut self, mode: ArmMode) -> JacoResult<()> {
        self.ensure_connected()
            .map_err(|_| JacoException::ModeError {
                message: format!("cannot switch to {:?} mode while disconnected", mode),
            })?;
        self.mode = mode;
        self.state.dq = [0.; N];
        Ok(())
    }

    fn command_position(&mut self, q: &[f64; N]) -> JacoResult<()> {
        self.ensure_connected()?;
        if self.mode != ArmMode::Position {
            return Err(create_command_exception(
                "position command sent while not in position mode",
            ));
        }
        if !self.settles {
            return Err(JacoException::HomingTimeout { timeout_s: 10. });
        }
        self.state = JointState::at_rest(*q);
        self.torque_load = [0.; N];
        Ok(())
    }

    fn command_torque(&mut self, command: &TorqueCommand<N>) -> JacoResult<()> {
        self.ensure_connected()?;
        if self.mode != ArmMode::Torque {
            return Err(create_command_exception(
                "torque command sent while not in torque mode",
            ));
        }
        if command.tau.iter().any(|x| !x.is_finite()) {
            return Err(create_command_exception("torque command is not finite"));
        }
        self.step(&command.tau);
        trace!("simulated arm stepped to {:?}", self.state.q);
        Ok(())
    }

    fn read_feedback(&mut self) -> JacoResult<JointState<N>> {
        if !self.connected {
            return Err(create_read_exception("feedback read while disconnected"));
        }
        Ok(self.state)
    }

    fn read_torque_load(&mut self) -> JacoResult<[f64; N]> {
        if !self.connected {
            return Err(create_read_exception("torque load read while disconnected"));
        }
        Ok(self.torque_load)
    }
}

#[cfg(test)]
mod tests {
    use crate::arm::arm_interface::{ArmInterface, ArmMode};
    use crate::arm::jaco2::HOME_POSITION;
    use crate::arm::joint_state::TorqueCommand;
    use crate::arm::simulated_arm::SimulatedArm;
    use crate::exception::JacoException;

    #[test]
    fn torque_accelerates_frictionless_joint() {
        let mut arm = SimulatedArm::new([0.; 2]);
        arm.connect().unwrap();
        arm.set_mode(ArmMode::Torque).unwrap();
        for _ in 0..1000 {
            arm.command_torque(&TorqueCommand::new([1., 0.])).unwrap();
        }
        let state = arm.read_feedback().unwrap();
        assert!((state.dq[0] - 1.).abs() < 1e-9);
        assert!((state.q[0] - 0.5005).abs() < 1e-6);
        assert_eq!(state.q[1], 0.);
        assert_eq!(state.dq[1], 0.);
    }

    #[test]
    fn coulomb_friction_holds_joint() {
        let mut arm = SimulatedArm::new([0.]).with_friction([0.], [1.]);
        arm.connect().unwrap();
        arm.set_mode(ArmMode::Torque).unwrap();
        for _ in 0..100 {
            arm.command_torque(&TorqueCommand::new([0.9])).unwrap();
        }
        assert_eq!(arm.read_feedback().unwrap().dq, [0.]);
        arm.command_torque(&TorqueCommand::new([1.5])).unwrap();
        assert!(arm.read_feedback().unwrap().dq[0] > 0.);
    }

    #[test]
    fn commands_require_matching_mode() {
        let mut arm = SimulatedArm::jaco2();
        assert!(arm.read_feedback().is_err());
        arm.connect().unwrap();
        assert!(matches!(
            arm.command_torque(&TorqueCommand::zeros()),
            Err(JacoException::CommandError { .. })
        ));
        arm.command_position(&HOME_POSITION).unwrap();
        arm.set_mode(ArmMode::Torque).unwrap();
        assert!(arm.command_position(&HOME_POSITION).is_err());
        arm.disconnect().unwrap();
        arm.disconnect().unwrap();
        assert!(!arm.is_connected());
    }

    #[test]
    fn never_settling_arm_times_out() {
        let mut arm = SimulatedArm::jaco2().never_settling();
        arm.connect().unwrap();
        assert!(matches!(
            arm.command_position(&HOME_POSITION),
            Err(JacoException::HomingTimeout { .. })
        ));
    }
}
