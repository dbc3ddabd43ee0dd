// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the token used to stop a running control loop from the outside.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation signal for a control session.
///
/// Clones share the same flag. The supervisor checks it once per cycle, before
/// reading feedback, so a torque command that is already being sent always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }
    /// Requests the running control loop to stop.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
    /// Clears the request so the token can be used for another session.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use crate::session::cancel::CancelToken;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let handler = token.clone();
        assert!(!token.is_cancelled());
        handler.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!handler.is_cancelled());
    }
}
