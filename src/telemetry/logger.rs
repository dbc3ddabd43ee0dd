// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the per-cycle telemetry sample and the in-memory buffer collecting them.
use crate::arm::joint_state::{JointState, TorqueCommand};
use crate::exception::JacoResult;
use crate::telemetry::archive::TelemetryArchive;
use crate::telemetry::record::TelemetryRecord;
use crate::telemetry::{SessionMetadata, TelemetrySink};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Duration;

/// Everything recorded in one control cycle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TelemetrySample<const N: usize> {
    /// Index of the control cycle, starting at zero.
    pub cycle: usize,
    /// Time since the control loop was started.
    pub time: Duration,
    /// Joint state read at the beginning of the cycle.
    pub state: JointState<N>,
    /// Clamped torque command sent to the arm.
    pub command: TorqueCommand<N>,
    /// Torque load measured by the arm in \[Nm\].
    pub torque_load: [f64; N],
    /// Friction compensation contained in the command in \[Nm\].
    pub friction: [f64; N],
}

/// Collects the samples of a session in memory and turns them into a
/// [`TelemetryRecord`] once the session is over.
///
/// The buffer is allocated once with the number of cycles of the session so
/// appending inside the control loop does not allocate. If an output directory is
/// set, [`flush`](`TelemetrySink::flush`) also writes the record to disk.
#[derive(Debug)]
pub struct TelemetryBuffer<const N: usize> {
    samples: Vec<TelemetrySample<N>>,
    output_directory: Option<PathBuf>,
}

impl<const N: usize> TelemetryBuffer<N> {
    pub fn new(capacity: usize) -> Self {
        TelemetryBuffer {
            samples: Vec::with_capacity(capacity),
            output_directory: None,
        }
    }
    /// Lets [`flush`](`TelemetrySink::flush`) write the record into `directory`.
    pub fn persist_to<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.output_directory = Some(directory.into());
        self
    }
    /// Samples recorded since the last flush.
    pub fn samples(&self) -> &[TelemetrySample<N>] {
        &self.samples
    }
    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }
}

impl<const N: usize> TelemetrySink<N> for TelemetryBuffer<N> {
    fn reserve(&mut self, cycles: usize) {
        self.samples.reserve(cycles);
    }

    fn append(&mut self, sample: TelemetrySample<N>) {
        self.samples.push(sample);
    }

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn flush(&mut self, metadata: &SessionMetadata<N>) -> JacoResult<TelemetryRecord> {
        let record = TelemetryRecord::from_samples(&self.samples, metadata);
        debug!("flushing {} telemetry samples", self.samples.len());
        if let Some(directory) = &self.output_directory {
            if record.cycles() > 0 {
                TelemetryArchive::save(&record, directory)?;
                info!("telemetry written to {:?}", directory);
            }
        }
        self.samples.clear();
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use crate::arm::joint_state::{JointState, TorqueCommand};
    use crate::control::joint_controller::ControllerGains;
    use crate::exception::JacoException;
    use crate::telemetry::logger::{TelemetryBuffer, TelemetrySample};
    use crate::telemetry::{SessionMetadata, TelemetrySink};
    use std::time::Duration;

    fn sample(cycle: usize) -> TelemetrySample<2> {
        TelemetrySample {
            cycle,
            time: Duration::from_millis(cycle as u64),
            state: JointState::new([cycle as f64, 0.], [0.; 2]),
            command: TorqueCommand::new([1., -1.]),
            torque_load: [0.5, -0.5],
            friction: [0.; 2],
        }
    }

    #[test]
    fn buffer_is_preallocated_and_cleared_on_flush() {
        let mut buffer = TelemetryBuffer::new(100);
        assert!(buffer.capacity() >= 100);
        (0..10).for_each(|i| buffer.append(sample(i)));
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.samples()[3].cycle, 3);
        let metadata = SessionMetadata::new(ControllerGains::uniform(1., 2.), [0.; 2], [0.; 2]);
        let record = buffer.flush(&metadata).unwrap();
        assert_eq!(record.cycles(), 10);
        assert!(buffer.is_empty());
    }

    #[test]
    fn failed_save_keeps_samples() {
        let directory = tempfile::tempdir().unwrap();
        let blocked = directory.path().join("occupied");
        std::fs::write(&blocked, b"not a directory").unwrap();
        let mut buffer = TelemetryBuffer::new(30).persist_to(&blocked);
        (0..30).for_each(|i| buffer.append(sample(i)));
        let metadata = SessionMetadata::new(ControllerGains::uniform(1., 2.), [0.; 2], [0.; 2]);
        assert!(matches!(
            buffer.flush(&metadata),
            Err(JacoException::TelemetryError { .. })
        ));
        assert_eq!(buffer.len(), 30);

        let mut retry = TelemetryBuffer::new(30).persist_to(directory.path().join("session"));
        buffer.samples().iter().for_each(|x| retry.append(*x));
        assert_eq!(retry.flush(&metadata).unwrap().cycles(), 30);
    }

    #[test]
    fn reserve_preallocates() {
        let mut buffer = TelemetryBuffer::<2>::new(0);
        buffer.reserve(500);
        assert!(buffer.capacity() >= 500);
        assert!(buffer.is_empty());
    }

    #[test]
    fn empty_session_writes_nothing() {
        let directory = tempfile::tempdir().unwrap();
        let output = directory.path().join("session");
        let mut buffer = TelemetryBuffer::<2>::new(10).persist_to(&output);
        let metadata = SessionMetadata::new(ControllerGains::uniform(1., 2.), [0.; 2], [0.; 2]);
        let record = buffer.flush(&metadata).unwrap();
        assert_eq!(record.cycles(), 0);
        assert!(!output.exists());
    }
}
