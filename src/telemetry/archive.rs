// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains functions for writing a [`TelemetryRecord`] to disk and reading it back.
//!
//! Every signal is stored in its own file `<name>.bin.gz` inside the session directory:
//! a gzip compressed, bincode serialized [`SignalArray`].
use crate::exception::{JacoException, JacoResult};
use crate::telemetry::record::{SignalArray, TelemetryRecord, SIGNAL_NAMES};
use bincode::{deserialize_from, serialize_into};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File extension of a stored signal.
pub static SIGNAL_FILE_EXTENSION: &str = "bin.gz";

pub struct TelemetryArchive {}

impl TelemetryArchive {
    /// Writes every signal of `record` into `directory`, creating it if necessary.
    /// # Errors
    /// * [`TelemetryError`](`crate::exception::JacoException::TelemetryError`) if a file
    /// cannot be written.
    pub fn save<P: AsRef<Path>>(record: &TelemetryRecord, directory: P) -> JacoResult<()> {
        create_dir_all(directory.as_ref())?;
        for signal in &record.signals {
            let file = File::create(signal_path(directory.as_ref(), &signal.name))?;
            let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
            serialize_into(&mut encoder, signal)?;
            encoder.finish()?.flush()?;
        }
        Ok(())
    }

    /// Reads a record written by [`save`](`Self::save`).
    /// # Errors
    /// * [`TelemetryError`](`crate::exception::JacoException::TelemetryError`) if a signal
    /// is missing or cannot be decoded.
    pub fn load<P: AsRef<Path>>(directory: P) -> JacoResult<TelemetryRecord> {
        let mut signals = Vec::with_capacity(SIGNAL_NAMES.len());
        for name in SIGNAL_NAMES.iter() {
            let path = signal_path(directory.as_ref(), name);
            let file = File::open(&path).map_err(|error| JacoException::TelemetryError {
                message: format!("cannot open {:?}: {}", path, error),
            })?;
            let signal: SignalArray = deserialize_from(GzDecoder::new(BufReader::new(file)))?;
            if signal.name != *name {
                return Err(JacoException::TelemetryError {
                    message: format!("{:?} contains signal {}", path, signal.name),
                });
            }
            signals.push(signal);
        }
        Ok(TelemetryRecord { signals })
    }
}

fn signal_path(directory: &Path, name: &str) -> PathBuf {
    directory.join(format!("{}.{}", name, SIGNAL_FILE_EXTENSION))
}
