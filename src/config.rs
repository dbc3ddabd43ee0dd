// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the session configuration which can be loaded from a TOML file.
//!
//! Every section and every field is optional, missing values are taken from
//! [`SessionConfig::default`], which describes the friction compensation session of a Jaco2:
//! ```toml
//! [controller]
//! mode = "tracking"
//! kp = 10.0
//! kv = [3.3, 3.3, 3.3, 2.0, 2.0, 2.0]
//!
//! [friction]
//! smoothing = 0.7
//! effort_source = "position_error"
//!
//! [session]
//! loop_limit = 10000
//! target_position = [2.0, 2.75, 3.45, 1.0, 0.85, 0.5]
//!
//! [telemetry]
//! output_dir = "friction_compensation"
//! ```
use std::convert::TryFrom;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::arm::jaco2::{
    F_BRK, F_COULOMB, FRICTION_TEST_TARGET, HOME_POSITION, INIT_TORQUE_POSITION, MAX_TORQUE,
    STRIBECK_VELOCITY, VISCOUS_FRICTION,
};
use crate::arm::joint_state::Target;
use crate::control::control_tools::RealtimeConfig;
use crate::control::friction::{
    FrictionEstimator, FrictionParameters, DEFAULT_EFFORT_THRESHOLD, DEFAULT_VELOCITY_EPSILON,
};
use crate::control::joint_controller::{ControlMode, ControllerGains, JointController};
use crate::exception::{JacoException, JacoResult};
use crate::session::supervisor::{EffortSource, SupervisorConfig};
use crate::telemetry::logger::TelemetryBuffer;

/// A gain which is either shared by all joints or given per joint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GainSetting {
    Scalar(f64),
    PerJoint(Vec<f64>),
}

impl GainSetting {
    fn resolve<const N: usize>(&self, name: &str) -> JacoResult<[f64; N]> {
        match self {
            GainSetting::Scalar(value) => Ok([*value; N]),
            GainSetting::PerJoint(values) => joint_array(values, name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerSection {
    pub mode: ControlMode,
    pub kp: GainSetting,
    pub kv: GainSetting,
    /// Whether the position error is wrapped into \[-π, π).
    pub wrap_position_error: bool,
}

impl Default for ControllerSection {
    fn default() -> Self {
        ControllerSection {
            mode: ControlMode::Tracking,
            kp: GainSetting::Scalar(10.),
            kv: GainSetting::Scalar(3.3),
            wrap_position_error: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrictionSection {
    /// Whether friction compensation is added to the controller torque at all.
    pub enabled: bool,
    pub f_brk: Vec<f64>,
    pub f_coulomb: Vec<f64>,
    pub viscous: Vec<f64>,
    pub stribeck_velocity: Vec<f64>,
    pub velocity_epsilon: f64,
    pub effort_threshold: f64,
    /// Decay of the output filter in \[0, 1\), no filtering if absent.
    pub smoothing: Option<f64>,
    pub effort_source: EffortSource,
}

impl Default for FrictionSection {
    fn default() -> Self {
        FrictionSection {
            enabled: true,
            f_brk: F_BRK.to_vec(),
            f_coulomb: F_COULOMB.to_vec(),
            viscous: VISCOUS_FRICTION.to_vec(),
            stribeck_velocity: STRIBECK_VELOCITY.to_vec(),
            velocity_epsilon: DEFAULT_VELOCITY_EPSILON,
            effort_threshold: DEFAULT_EFFORT_THRESHOLD,
            smoothing: None,
            effort_source: EffortSource::PositionError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSection {
    pub loop_limit: usize,
    pub u_max: Vec<f64>,
    pub home_position: Vec<f64>,
    pub target_position: Vec<f64>,
    pub target_velocity: Option<Vec<f64>>,
    pub velocity_deadband: f64,
    pub torque_deadband: f64,
    pub realtime: RealtimeConfig,
    pub read_initial_torque_load: bool,
}

impl Default for SessionSection {
    fn default() -> Self {
        SessionSection {
            loop_limit: 10000,
            u_max: MAX_TORQUE.to_vec(),
            home_position: HOME_POSITION.to_vec(),
            target_position: FRICTION_TEST_TARGET.to_vec(),
            target_velocity: None,
            velocity_deadband: DEFAULT_VELOCITY_EPSILON,
            torque_deadband: 0.01,
            realtime: RealtimeConfig::Ignore,
            read_initial_torque_load: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetrySection {
    /// Directory the telemetry is written to. Nothing is written if absent.
    pub output_dir: Option<PathBuf>,
}

/// Complete configuration of a control session.
///
/// The configuration is independent of the number of joints. The builder methods
/// check that every per-joint list has exactly `N` entries.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub controller: ControllerSection,
    pub friction: FrictionSection,
    pub session: SessionSection,
    pub telemetry: TelemetrySection,
}

impl SessionConfig {
    /// Loads a configuration from a TOML file.
    /// # Errors
    /// * ConfigError if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> JacoResult<Self> {
        let content = read_to_string(path.as_ref()).map_err(|e| JacoException::ConfigError {
            message: format!("cannot read {:?}: {}", path.as_ref(), e),
        })?;
        content.parse()
    }

    /// Configuration of the floating controller session: no friction compensation,
    /// pure damping and the torque load read once at the torque reading pose, which
    /// also serves as home pose.
    pub fn floating() -> Self {
        let mut config = SessionConfig::default();
        config.controller.mode = ControlMode::Floating;
        config.controller.kp = GainSetting::Scalar(0.);
        config.friction.enabled = false;
        config.session.home_position = INIT_TORQUE_POSITION.to_vec();
        config.session.target_position = INIT_TORQUE_POSITION.to_vec();
        config.session.read_initial_torque_load = true;
        config
    }

    /// Checks that the configuration describes an arm with `N` joints.
    /// # Errors
    /// * ConfigError naming the first invalid field.
    pub fn validate<const N: usize>(&self) -> JacoResult<()> {
        self.controller::<N>()?;
        self.friction_estimator::<N>()?;
        self.supervisor_config::<N>()?;
        self.target::<N>()?;
        Ok(())
    }

    pub fn controller<const N: usize>(&self) -> JacoResult<JointController<N>> {
        let gains = ControllerGains::per_joint(
            self.controller.kp.resolve("controller.kp")?,
            self.controller.kv.resolve("controller.kv")?,
        );
        Ok(JointController::new(gains, self.controller.mode)
            .wrap_position_error(self.controller.wrap_position_error))
    }

    /// The friction estimator, or `None` if friction compensation is disabled.
    pub fn friction_estimator<const N: usize>(&self) -> JacoResult<Option<FrictionEstimator<N>>> {
        let friction = &self.friction;
        if !friction.enabled {
            return Ok(None);
        }
        let mut parameters = FrictionParameters::new(
            joint_array(&friction.f_brk, "friction.f_brk")?,
            joint_array(&friction.f_coulomb, "friction.f_coulomb")?,
            joint_array(&friction.viscous, "friction.viscous")?,
            joint_array(&friction.stribeck_velocity, "friction.stribeck_velocity")?,
        )
        .with_deadbands(friction.velocity_epsilon, friction.effort_threshold);
        if let Some(decay) = friction.smoothing {
            if !(0. ..1.).contains(&decay) {
                return Err(config_error(format!(
                    "friction.smoothing must be in [0, 1), got {}",
                    decay
                )));
            }
            parameters = parameters.with_smoothing(decay);
        }
        Ok(Some(FrictionEstimator::new(parameters)))
    }

    pub fn supervisor_config<const N: usize>(&self) -> JacoResult<SupervisorConfig<N>> {
        let session = &self.session;
        let u_max: [f64; N] = joint_array(&session.u_max, "session.u_max")?;
        if u_max.iter().any(|x| !(*x >= 0.)) {
            return Err(config_error(format!(
                "session.u_max must not be negative, got {:?}",
                u_max
            )));
        }
        let mut config = SupervisorConfig::new(
            session.loop_limit,
            u_max,
            joint_array(&session.home_position, "session.home_position")?,
        );
        config.velocity_deadband = session.velocity_deadband;
        config.torque_deadband = session.torque_deadband;
        config.effort_source = self.friction.effort_source;
        config.realtime = session.realtime;
        config.read_initial_torque_load = session.read_initial_torque_load;
        Ok(config)
    }

    pub fn target<const N: usize>(&self) -> JacoResult<Target<N>> {
        let q = joint_array(&self.session.target_position, "session.target_position")?;
        match &self.session.target_velocity {
            Some(dq) => Ok(Target::with_velocity(
                q,
                joint_array(dq, "session.target_velocity")?,
            )),
            None => Ok(Target::position(q)),
        }
    }

    /// A buffer large enough for the whole session which persists to the configured
    /// output directory.
    pub fn telemetry_buffer<const N: usize>(&self) -> TelemetryBuffer<N> {
        let buffer = TelemetryBuffer::new(self.session.loop_limit);
        match &self.telemetry.output_dir {
            Some(directory) => buffer.persist_to(directory.clone()),
            None => buffer,
        }
    }
}

impl FromStr for SessionConfig {
    type Err = JacoException;

    fn from_str(s: &str) -> JacoResult<Self> {
        Ok(toml::from_str(s)?)
    }
}

fn config_error(message: String) -> JacoException {
    JacoException::ConfigError { message }
}

fn joint_array<const N: usize>(values: &[f64], name: &str) -> JacoResult<[f64; N]> {
    <[f64; N]>::try_from(values).map_err(|_| {
        config_error(format!(
            "{} needs {} entries, got {}",
            name,
            N,
            values.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::arm::jaco2::{
        FRICTION_TEST_TARGET, HOME_POSITION, INIT_TORQUE_POSITION, MAX_TORQUE,
    };
    use crate::config::{GainSetting, SessionConfig};
    use crate::control::joint_controller::{ControlMode, ControllerGains};
    use crate::exception::JacoException;
    use crate::session::supervisor::EffortSource;
    use crate::telemetry::TelemetrySink;

    #[test]
    fn default_is_the_friction_compensation_session() {
        let config = SessionConfig::default();
        assert_eq!(config.controller.kp, GainSetting::Scalar(10.));
        assert_eq!(config.controller.kv, GainSetting::Scalar(3.3));
        assert_eq!(config.session.loop_limit, 10000);

        let controller = config.controller::<6>().unwrap();
        assert_eq!(controller.gains(), &ControllerGains::uniform(10., 3.3));
        assert_eq!(controller.mode(), ControlMode::Tracking);
        assert_eq!(config.target::<6>().unwrap().q, FRICTION_TEST_TARGET);
        let supervisor = config.supervisor_config::<6>().unwrap();
        assert_eq!(supervisor.u_max, MAX_TORQUE);
        assert_eq!(supervisor.home_position, HOME_POSITION);
        assert!(config.friction_estimator::<6>().unwrap().is_some());
        assert!(config.telemetry.output_dir.is_none());
    }

    #[test]
    fn floating_session_has_no_friction() {
        let config = SessionConfig::floating();
        assert!(config.friction_estimator::<6>().unwrap().is_none());
        assert_eq!(config.controller::<6>().unwrap().mode(), ControlMode::Floating);
        let supervisor = config.supervisor_config::<6>().unwrap();
        assert!(supervisor.read_initial_torque_load);
        assert_eq!(supervisor.home_position, INIT_TORQUE_POSITION);
    }

    #[test]
    fn partial_file_overrides_defaults() {
        let config: SessionConfig = r#"
            [controller]
            kp = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
            kv = 0.5

            [friction]
            smoothing = 0.7
            effort_source = "command_torque"

            [session]
            loop_limit = 250
            realtime = "ignore"
        "#
        .parse()
        .unwrap();
        let gains = *config.controller::<6>().unwrap().gains();
        assert_eq!(gains.kp, [1., 2., 3., 4., 5., 6.]);
        assert_eq!(gains.kv, [0.5; 6]);
        let supervisor = config.supervisor_config::<6>().unwrap();
        assert_eq!(supervisor.loop_limit, 250);
        assert_eq!(supervisor.effort_source, EffortSource::CommandTorque);
        let estimator = config.friction_estimator::<6>().unwrap().unwrap();
        assert_eq!(estimator.parameters().smoothing, Some(0.7));
        assert!(config.validate::<6>().is_ok());
    }

    #[test]
    fn joint_count_mismatch_is_rejected() {
        let config: SessionConfig = "[controller]\nkp = [1.0, 2.0]\n".parse().unwrap();
        assert!(matches!(
            config.controller::<6>(),
            Err(JacoException::ConfigError { .. })
        ));
        assert!(config.controller::<2>().is_ok());
        // the remaining defaults describe six joints
        assert!(config.validate::<2>().is_err());
        assert!(config.validate::<6>().is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let smoothing: SessionConfig = "[friction]\nsmoothing = 1.0\n".parse().unwrap();
        assert!(smoothing.friction_estimator::<6>().is_err());
        let u_max: SessionConfig = "[session]\nu_max = [1.0, 1.0, 1.0, 1.0, 1.0, -1.0]\n"
            .parse()
            .unwrap();
        assert!(u_max.supervisor_config::<6>().is_err());
        assert!(matches!(
            "[session]\nloop_limt = 3\n".parse::<SessionConfig>(),
            Err(JacoException::ConfigError { .. })
        ));
        assert!(matches!(
            "[controller]\nmode = \"impedance\"\n".parse::<SessionConfig>(),
            Err(JacoException::ConfigError { .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nloop_limit = 42\n").unwrap();
        writeln!(file, "[telemetry]\noutput_dir = \"/tmp/jaco_session\"").unwrap();
        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.session.loop_limit, 42);
        let buffer = config.telemetry_buffer::<6>();
        assert!(buffer.capacity() >= 42);
        assert!(buffer.is_empty());

        let directory = tempfile::tempdir().unwrap();
        assert!(matches!(
            SessionConfig::load(directory.path().join("missing.toml")),
            Err(JacoException::ConfigError { .. })
        ));
    }
}
