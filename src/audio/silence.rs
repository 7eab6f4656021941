//! Silence classification for captured frames

/// Root-mean-square amplitude of a frame
///
/// Samples are widened to f64 before squaring so large i16 values
/// cannot overflow the accumulator.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn rms(frame: &[i16]) -> f32 {
    debug_assert!(!frame.is_empty(), "zero-length frame");
    if frame.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = frame.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    #[allow(clippy::cast_possible_truncation)]
    let value = (sum_squares / frame.len() as f64).sqrt() as f32;
    value
}

/// Classify a frame as silent: `rms(frame) < threshold`
///
/// Exactly at the threshold a frame is non-silent.
#[must_use]
pub fn is_silent(frame: &[i16], threshold: f32) -> bool {
    rms(frame) < threshold
}
