// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains functions for filtering signals with a first-order low-pass filter.

/// Decay used by the friction compensation session when smoothing is enabled.
pub static DEFAULT_FRICTION_DECAY: f64 = 0.7;

/// Applies one step of a first-order IIR filter
/// `decay * y_last + (1 - decay) * y`.
///
/// # Arguments
/// * `decay` - Weight of the previous output in \[0, 1).
/// * `y` - Current value of the signal to be filtered
/// * `y_last` - Filtered value of the previous time step
/// # Panics
/// This function panics if:
/// * y is infinite or NaN.
/// * y_last is infinite or NaN.
/// * decay is outside of \[0, 1).
/// # Return
/// Filtered value.
pub fn exponential_filter(decay: f64, y: f64, y_last: f64) -> f64 {
    assert!((0. ..1.).contains(&decay));
    assert!(y.is_finite() && y_last.is_finite());
    decay * y_last + (1. - decay) * y
}

#[cfg(test)]
mod tests {
    use crate::control::low_pass_filter::{exponential_filter, DEFAULT_FRICTION_DECAY};

    #[test]
    fn decay_weights_previous_output() {
        assert!((exponential_filter(DEFAULT_FRICTION_DECAY, 1.0, 0.0) - 0.3).abs() < 1e-12);
        assert!((exponential_filter(0.7, 0.0, 1.0) - 0.7).abs() < 1e-12);
        assert_eq!(exponential_filter(0., 2.5, -4.), 2.5);
    }

    #[test]
    #[should_panic]
    fn decay_of_one_is_rejected() {
        exponential_filter(1., 0., 0.);
    }
}
