// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the guard which returns the arm to a safe state on every exit path.
use crate::exception::JacoResult;
use log::{error, warn};
use std::ops::{Deref, DerefMut};

/// Something that can bring the arm back into a safe state and release it.
pub trait Recover {
    /// Switches to position mode, moves home and disconnects.
    /// Every step is attempted even if a previous one failed.
    fn recover(&mut self) -> JacoResult<()>;
}

/// Scoped guard around the part of a session in which the arm may move.
///
/// [`finish`](`Self::finish`) runs the recovery and reports its result. If the guard is
/// dropped without being finished, e.g. because the control loop panicked, the recovery
/// runs in `drop` and its result is only logged.
pub struct SafeReturn<'a, T: Recover> {
    inner: &'a mut T,
    armed: bool,
}

impl<'a, T: Recover> SafeReturn<'a, T> {
    pub fn new(inner: &'a mut T) -> Self {
        SafeReturn { inner, armed: true }
    }
    /// Runs the recovery and disarms the guard.
    pub fn finish(mut self) -> JacoResult<()> {
        self.armed = false;
        self.inner.recover()
    }
}

impl<'a, T: Recover> Deref for SafeReturn<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.inner
    }
}

impl<'a, T: Recover> DerefMut for SafeReturn<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.inner
    }
}

impl<'a, T: Recover> Drop for SafeReturn<'a, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("session left without finishing, returning arm to a safe state");
        if let Err(e) = self.inner.recover() {
            error!("recovery failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::exception::{JacoException, JacoResult};
    use crate::session::safe_return::{Recover, SafeReturn};
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[derive(Default)]
    struct Counter {
        recoveries: usize,
        fail: bool,
    }

    impl Recover for Counter {
        fn recover(&mut self) -> JacoResult<()> {
            self.recoveries += 1;
            if self.fail {
                return Err(JacoException::CommandError {
                    message: "home unreachable".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn finish_recovers_once() {
        let mut counter = Counter::default();
        let guard = SafeReturn::new(&mut counter);
        assert!(guard.finish().is_ok());
        assert_eq!(counter.recoveries, 1);
    }

    #[test]
    fn finish_reports_recovery_error() {
        let mut counter = Counter {
            recoveries: 0,
            fail: true,
        };
        let guard = SafeReturn::new(&mut counter);
        assert!(guard.finish().is_err());
        assert_eq!(counter.recoveries, 1);
    }

    #[test]
    fn drop_recovers_on_early_return_and_panic() {
        let mut counter = Counter::default();
        {
            let mut guard = SafeReturn::new(&mut counter);
            guard.fail = false;
        }
        assert_eq!(counter.recoveries, 1);

        let result = catch_unwind(AssertUnwindSafe(|| {
            let _guard = SafeReturn::new(&mut counter);
            panic!("control loop failed");
        }));
        assert!(result.is_err());
        assert_eq!(counter.recoveries, 2);
    }
}
