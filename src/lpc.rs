//! Linear-prediction signal extension (spec.md §4.7).
//!
//! Used at drain to extrapolate a short run of samples past the true end
//! of input, reducing the end-of-stream artefacts a hard zero-cut would
//! otherwise introduce. Not grounded on a specific file in the pack (none
//! of the five teacher repos implement LPC); this is a direct, idiomatic
//! transcription of the Levinson-Durbin recursion spec.md §4.7 names,
//! following the same `Vec<f32>`-based, no-`unsafe` style as the rest of
//! this crate's DSP-adjacent modules ([`crate::resample`]).

/// Prediction order used for signal extension.
pub const LPC_ORDER: usize = 24;

/// Early-exit threshold on the Levinson-Durbin recursion's residual error,
/// relative to the zero-lag autocorrelation (spec.md §4.7: `ε·aut[0] + ε'`).
const EPSILON_REL: f64 = 1e-9;
const EPSILON_ABS: f64 = 1e-9;

/// Per-recursion-step damping applied to coefficients (spec.md §4.7).
const DAMPING: f64 = 0.99;

/// Extrapolates `after` additional samples past the end of `history` by
/// linear prediction.
///
/// `history` holds one channel's most recent PCM samples, oldest first.
/// Falls back to zero-padding if `history` is shorter than `4 * LPC_ORDER`,
/// per spec.md §4.7.
#[must_use]
pub fn extrapolate(history: &[f32], after: usize) -> Vec<f32> {
    if history.len() < 4 * LPC_ORDER {
        return vec![0.0; after];
    }

    let autocorrelation = autocorrelate(history, LPC_ORDER);
    let coefficients = levinson_durbin(&autocorrelation);

    let mut extended: Vec<f64> = history.iter().map(|&s| f64::from(s)).collect();
    let start = extended.len();
    extended.resize(start + after, 0.0);

    for i in start..extended.len() {
        let mut prediction = 0.0f64;
        for (k, &coeff) in coefficients.iter().enumerate() {
            prediction += coeff * extended[i - 1 - k];
        }
        extended[i] = prediction;
    }

    #[allow(clippy::cast_possible_truncation)]
    extended[start..].iter().map(|&s| s as f32).collect()
}

/// Autocorrelation at lags `0..=order` over `samples`.
fn autocorrelate(samples: &[f32], order: usize) -> Vec<f64> {
    let data: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();
    (0..=order)
        .map(|lag| data.iter().zip(data[lag..].iter()).map(|(a, b)| a * b).sum())
        .collect()
}

/// Levinson-Durbin recursion producing `order` LPC coefficients, with
/// early exit once the residual error is negligible and per-step damping
/// to keep extrapolation stable (spec.md §4.7).
fn levinson_durbin(autocorrelation: &[f64]) -> Vec<f64> {
    let order = autocorrelation.len() - 1;
    let mut error = autocorrelation[0];
    let mut coefficients = vec![0.0f64; order];

    if error <= 0.0 {
        return coefficients;
    }

    for i in 0..order {
        let mut acc = autocorrelation[i + 1];
        for j in 0..i {
            acc -= coefficients[j] * autocorrelation[i - j];
        }
        let reflection = acc / error;

        let mut updated = coefficients.clone();
        updated[i] = reflection;
        for j in 0..i {
            updated[j] = coefficients[j] - reflection * coefficients[i - 1 - j];
        }
        coefficients = updated;

        error *= 1.0 - reflection * reflection;

        if error < EPSILON_REL * autocorrelation[0] + EPSILON_ABS {
            break;
        }
    }

    for (k, coeff) in coefficients.iter_mut().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let damping = DAMPING.powi(k as i32 + 1);
        *coeff *= damping;
    }
    coefficients
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_history_falls_back_to_zero_padding() {
        let history = vec![1.0; LPC_ORDER];
        let out = extrapolate(&history, 10);
        assert_eq!(out, vec![0.0; 10]);
    }

    #[test]
    fn constant_signal_extrapolates_close_to_the_same_constant() {
        let history = vec![0.5f32; 8 * LPC_ORDER];
        let out = extrapolate(&history, 16);
        for sample in out {
            assert!((sample - 0.5).abs() < 0.1, "expected close to 0.5, got {sample}");
        }
    }

    #[test]
    fn silence_extrapolates_to_silence() {
        let history = vec![0.0f32; 8 * LPC_ORDER];
        let out = extrapolate(&history, 32);
        assert!(out.iter().all(|&s| s.abs() < 1e-6));
    }
}
