// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the index-aligned signal arrays a session is persisted as.
use crate::telemetry::logger::TelemetrySample;
use crate::telemetry::SessionMetadata;
use serde::{Deserialize, Serialize};

/// Names of the signals of a [`TelemetryRecord`] in the order they are stored.
pub static SIGNAL_NAMES: [&str; 10] = [
    "error",
    "gains",
    "target_pos",
    "joint_angles",
    "torques_sent",
    "torques_read",
    "friction",
    "velocity",
    "times",
    "F_brk",
];

/// A named, row-major array of values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignalArray {
    pub name: String,
    /// Length of every dimension, outermost first.
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl SignalArray {
    /// Creates a scalar signal.
    pub fn scalar(name: &str, value: f64) -> Self {
        SignalArray {
            name: name.to_string(),
            shape: Vec::new(),
            data: vec![value],
        }
    }
    /// Creates a one-dimensional signal.
    pub fn vector(name: &str, values: &[f64]) -> Self {
        SignalArray {
            name: name.to_string(),
            shape: vec![values.len()],
            data: values.to_vec(),
        }
    }
    /// Creates a two-dimensional signal from its rows.
    pub fn rows<const N: usize>(name: &str, rows: &[&[f64; N]]) -> Self {
        SignalArray {
            name: name.to_string(),
            shape: vec![rows.len(), N],
            data: rows.iter().flat_map(|row| row.iter().copied()).collect(),
        }
    }
    /// Creates a joints × cycles signal; row `j` holds joint `j`, column `i` cycle `i`.
    pub fn joints_by_cycles<const N: usize>(name: &str, columns: &[[f64; N]]) -> Self {
        let cycles = columns.len();
        let mut data = vec![0.; N * cycles];
        for (i, column) in columns.iter().enumerate() {
            for (j, value) in column.iter().enumerate() {
                data[j * cycles + i] = *value;
            }
        }
        SignalArray {
            name: name.to_string(),
            shape: vec![N, cycles],
            data,
        }
    }
    /// Value at the given row and column of a two-dimensional signal.
    pub fn at(&self, row: usize, column: usize) -> Option<f64> {
        if self.shape.len() != 2 || row >= self.shape[0] || column >= self.shape[1] {
            return None;
        }
        self.data.get(row * self.shape[1] + column).copied()
    }
    /// Number of values along the last dimension.
    pub fn columns(&self) -> usize {
        self.shape.last().copied().unwrap_or(1)
    }
}

/// All signals of one control session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub signals: Vec<SignalArray>,
}

impl TelemetryRecord {
    /// Builds the record of a session from its samples.
    ///
    /// The `error` signal is the Euclidean norm of the difference between the read and
    /// the sent torques over all joints and cycles.
    pub fn from_samples<const N: usize>(
        samples: &[TelemetrySample<N>],
        metadata: &SessionMetadata<N>,
    ) -> Self {
        let error = samples
            .iter()
            .flat_map(|sample| {
                sample
                    .torque_load
                    .iter()
                    .zip(sample.command.tau.iter())
                    .map(|(read, sent)| (read - sent).powi(2))
                    .collect::<Vec<f64>>()
            })
            .sum::<f64>()
            .sqrt();
        let times: Vec<f64> = samples.iter().map(|x| x.time.as_secs_f64()).collect();
        let signals = vec![
            SignalArray::scalar("error", error),
            SignalArray::rows("gains", &[&metadata.gains.kp, &metadata.gains.kv]),
            SignalArray::vector("target_pos", &metadata.target_pos),
            SignalArray::joints_by_cycles("joint_angles", &per_cycle(samples, |x| x.state.q)),
            SignalArray::joints_by_cycles("torques_sent", &per_cycle(samples, |x| x.command.tau)),
            SignalArray::joints_by_cycles("torques_read", &per_cycle(samples, |x| x.torque_load)),
            SignalArray::joints_by_cycles("friction", &per_cycle(samples, |x| x.friction)),
            SignalArray::joints_by_cycles("velocity", &per_cycle(samples, |x| x.state.dq)),
            SignalArray::vector("times", &times),
            SignalArray::vector("F_brk", &metadata.f_brk),
        ];
        TelemetryRecord { signals }
    }
    /// Looks up a signal by name.
    pub fn signal(&self, name: &str) -> Option<&SignalArray> {
        self.signals.iter().find(|x| x.name == name)
    }
    /// Number of control cycles contained in the record.
    pub fn cycles(&self) -> usize {
        self.signal("times").map(|x| x.data.len()).unwrap_or(0)
    }
    /// Whether every per-cycle signal has exactly one column per cycle.
    pub fn is_aligned(&self) -> bool {
        let cycles = self.cycles();
        [
            "joint_angles",
            "torques_sent",
            "torques_read",
            "friction",
            "velocity",
            "times",
        ]
        .iter()
        .all(|name| {
            self.signal(name)
                .map(|x| x.columns() == cycles)
                .unwrap_or(false)
        })
    }
}

fn per_cycle<const N: usize, F: Fn(&TelemetrySample<N>) -> [f64; N]>(
    samples: &[TelemetrySample<N>],
    signal: F,
) -> Vec<[f64; N]> {
    samples.iter().map(signal).collect()
}

#[cfg(test)]
mod tests {
    use crate::arm::joint_state::{JointState, TorqueCommand};
    use crate::control::joint_controller::ControllerGains;
    use crate::telemetry::logger::TelemetrySample;
    use crate::telemetry::record::{SignalArray, TelemetryRecord, SIGNAL_NAMES};
    use crate::telemetry::SessionMetadata;
    use std::time::Duration;

    fn samples() -> Vec<TelemetrySample<3>> {
        (0..4)
            .map(|i| {
                let x = i as f64;
                TelemetrySample {
                    cycle: i,
                    time: Duration::from_millis(i as u64),
                    state: JointState::new([x, x + 10., x + 20.], [-x; 3]),
                    command: TorqueCommand::new([1.; 3]),
                    torque_load: [1., 1., 3.],
                    friction: [0.1 * x; 3],
                }
            })
            .collect()
    }

    #[test]
    fn record_is_cycle_aligned() {
        let metadata = SessionMetadata::new(
            ControllerGains::uniform(10., 3.3),
            [2.0, 2.75, 3.45],
            [1.25, 1.75, 0.75],
        );
        let record = TelemetryRecord::from_samples(&samples(), &metadata);
        let names: Vec<&str> = record.signals.iter().map(|x| x.name.as_str()).collect();
        assert_eq!(names, SIGNAL_NAMES.to_vec());
        assert_eq!(record.cycles(), 4);
        assert!(record.is_aligned());

        let angles = record.signal("joint_angles").unwrap();
        assert_eq!(angles.shape, vec![3, 4]);
        for cycle in 0..4 {
            assert_eq!(angles.at(0, cycle), Some(cycle as f64));
            assert_eq!(angles.at(2, cycle), Some(cycle as f64 + 20.));
        }
        assert_eq!(angles.at(3, 0), None);

        let gains = record.signal("gains").unwrap();
        assert_eq!(gains.shape, vec![2, 3]);
        assert_eq!(gains.at(0, 1), Some(10.));
        assert_eq!(gains.at(1, 2), Some(3.3));

        // only the third joint differs by 2 Nm in each of the 4 cycles
        let error = record.signal("error").unwrap();
        assert!((error.data[0] - 4.).abs() < 1e-12);
        assert_eq!(record.signal("times").unwrap().data[3], 0.003);
    }

    #[test]
    fn joints_by_cycles_layout() {
        let signal = SignalArray::joints_by_cycles("x", &[[1., 2.], [3., 4.], [5., 6.]]);
        assert_eq!(signal.shape, vec![2, 3]);
        assert_eq!(signal.data, vec![1., 3., 5., 2., 4., 6.]);
        assert_eq!(signal.columns(), 3);
    }
}
