// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains everything needed to record what happened during a control session.
//!
//! Samples are appended once per cycle to a [`TelemetrySink`] and flushed once after
//! the arm has been released. The flushed [`TelemetryRecord`](`record::TelemetryRecord`)
//! stores every signal as a named array; column `i` of every per-cycle array belongs
//! to control cycle `i`.

pub mod archive;
pub mod logger;
pub mod record;

use crate::control::joint_controller::ControllerGains;
use crate::exception::JacoResult;
use logger::TelemetrySample;
use record::TelemetryRecord;

/// Session wide values stored next to the per-cycle signals.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SessionMetadata<const N: usize> {
    /// Gains of the joint controller.
    pub gains: ControllerGains<N>,
    /// Target joint positions in \[rad\].
    pub target_pos: [f64; N],
    /// Breakaway friction of every joint in \[Nm\].
    pub f_brk: [f64; N],
}

impl<const N: usize> SessionMetadata<N> {
    pub fn new(gains: ControllerGains<N>, target_pos: [f64; N], f_brk: [f64; N]) -> Self {
        SessionMetadata {
            gains,
            target_pos,
            f_brk,
        }
    }
}

/// Receives the telemetry of a control session.
///
/// [`append`](`Self::append`) is called from inside the control loop and must not block
/// or allocate. The supervisor calls [`reserve`](`Self::reserve`) with the number of
/// cycles of the session before it connects to the arm, so sinks which buffer samples
/// have to allocate their storage there.
pub trait TelemetrySink<const N: usize> {
    /// Makes room for `cycles` more samples.
    fn reserve(&mut self, cycles: usize) {
        let _ = cycles;
    }
    /// Stores the sample of one control cycle.
    fn append(&mut self, sample: TelemetrySample<N>);
    /// Number of samples appended since the last flush.
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Turns all appended samples into a record and persists it. The samples are only
    /// discarded once the record was persisted, so a failed flush can be retried.
    /// # Errors
    /// * [`TelemetryError`](`crate::exception::JacoException::TelemetryError`) if the record
    /// could not be persisted.
    fn flush(&mut self, metadata: &SessionMetadata<N>) -> JacoResult<TelemetryRecord>;
}
