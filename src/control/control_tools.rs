// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Helpers used inside the control loop: deadbands, angle wrapping and
//! real-time scheduling of the loop thread.

use crate::exception::JacoException;
use crate::JacoResult;
use serde::Deserialize;
use std::f64::consts::PI;
use std::path::Path;

/// Used to decide whether to enforce realtime mode for the control loop thread.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealtimeConfig {
    Enforce,
    Ignore,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        RealtimeConfig::Ignore
    }
}

/// Sets every element whose magnitude is below `threshold` to exactly zero.
pub fn apply_deadband<const N: usize>(values: &[f64; N], threshold: f64) -> [f64; N] {
    let mut out = *values;
    out.iter_mut().for_each(|x| {
        if x.abs() < threshold {
            *x = 0.
        }
    });
    out
}

/// Wraps an angle difference into \[-π, π).
pub fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2. * PI) - PI
}

/// Determines whether the current OS kernel is a realtime kernel.
///
/// On Linux, this checks for the existence of `/sys/kernel/realtime`.
pub fn has_realtime_kernel() -> bool {
    Path::new("/sys/kernel/realtime").exists()
}

/// Prepares the calling thread for the control loop according to `config`.
///
/// # Errors
/// * RealTimeException if `config` is [`Enforce`](`RealtimeConfig::Enforce`) and the
/// kernel has no realtime capabilities or the priority cannot be set.
pub fn prepare_loop_thread(config: RealtimeConfig) -> JacoResult<()> {
    match config {
        RealtimeConfig::Ignore => Ok(()),
        RealtimeConfig::Enforce => {
            if !has_realtime_kernel() {
                return Err(JacoException::RealTimeException {
                    message: "jaco: Running kernel does not have realtime capabilities."
                        .to_string(),
                });
            }
            set_current_thread_to_highest_scheduler_priority()
        }
    }
}

/// Sets the current thread to the highest possible scheduler priority.
///
/// # Errors
/// * RealtimeException if realtime priority cannot be set for the current thread.
///
/// If the method returns an Error please check your /etc/security/limits.conf file
/// There should be a line like this:
/// ```text
///marco            -       rtprio          99
/// ```
pub fn set_current_thread_to_highest_scheduler_priority() -> JacoResult<()> {
    unsafe {
        let max_priority = libc::sched_get_priority_max(libc::SCHED_FIFO);
        if max_priority == -1 {
            return Err(JacoException::RealTimeException {
                message: "jaco: unable to get maximum possible thread priority".to_string(),
            });
        }
        // one below the maximum so kernel threads keep precedence
        let thread_param = libc::sched_param {
            sched_priority: max_priority - 1,
        };
        if libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &thread_param) != 0 {
            return Err(JacoException::RealTimeException {
                message: "jaco: unable to set realtime scheduling".to_string(),
            });
        }
        if libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) != 0 {
            return Err(JacoException::RealTimeException {
                message: "jaco: unable to lock memory".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::control::control_tools::{
        apply_deadband, has_realtime_kernel, prepare_loop_thread, wrap_angle, RealtimeConfig,
    };
    use crate::exception::JacoException;
    use std::f64::consts::PI;

    #[test]
    fn deadband_zeroes_small_values() {
        let out = apply_deadband(&[0.009, -0.009, 0.01, -0.5, 0., 3.], 0.01);
        assert_eq!(out, [0., 0., 0.01, -0.5, 0., 3.]);
    }

    #[test]
    fn wrap_angle_test() {
        assert!((wrap_angle(0.5) - 0.5).abs() < 1e-12);
        assert!((wrap_angle(2. * PI + 0.5) - 0.5).abs() < 1e-12);
        assert!((wrap_angle(-2. * PI - 0.5) + 0.5).abs() < 1e-12);
        assert!((wrap_angle(3.5) - (3.5 - 2. * PI)).abs() < 1e-12);
        assert!((wrap_angle(PI) + PI).abs() < 1e-12);
    }

    #[test]
    fn ignoring_realtime_always_succeeds() {
        assert!(prepare_loop_thread(RealtimeConfig::Ignore).is_ok());
    }

    #[test]
    fn enforcing_realtime_needs_rt_kernel() {
        if has_realtime_kernel() {
            return;
        }
        assert!(matches!(
            prepare_loop_thread(RealtimeConfig::Enforce),
            Err(JacoException::RealTimeException { .. })
        ));
    }
}
