//! Resonance scoring formulas
//!
//! Every formula is a pure function over `f64`. The shared contract:
//! - NaN anywhere in the input is rejected with [`Error::NotNumeric`]
//! - Out-of-domain values fail with [`Error::OutOfDomain`] or
//!   [`Error::DivisionByZero`], never a sentinel value
//! - Paired vectors of different length fail with [`Error::LengthMismatch`]
//!
//! ```rust
//! use por_engine::scoring;
//!
//! assert_eq!(scoring::existence(2.0, 3.0, 4.0)?, 24.0);
//! assert_eq!(scoring::gravity_tensor(&[1.0, 2.0], &[0.5, 0.5])?, 1.5);
//! assert!(scoring::self_coherence(1.0, 0.0, 0.0).is_err());
//! # Ok::<(), por_engine::Error>(())
//! ```

pub mod classify;

pub use classify::{is_por_null, is_por_structure, DEFAULT_STRUCTURE_KEYWORDS};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Reject NaN inputs, naming the first offender
fn ensure_numeric(values: &[(&str, f64)]) -> Result<()> {
    match values.iter().find(|(_, v)| v.is_nan()) {
        Some((name, _)) => Err(Error::not_numeric(*name)),
        None => Ok(()),
    }
}

fn ensure_numeric_slice(name: &str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| v.is_nan()) {
        Some(idx) => Err(Error::not_numeric(format!("{name}[{idx}]"))),
        None => Ok(()),
    }
}

fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    if value < 0.0 {
        return Err(Error::OutOfDomain {
            name: name.to_string(),
            value,
            constraint: ">= 0",
        });
    }
    Ok(())
}

fn ensure_same_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::LengthMismatch { expected, actual });
    }
    Ok(())
}

/// Inputs of the existence formula
///
/// `E` is always derived from these three values, never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSample {
    /// Question pressure `Q`
    #[serde(rename = "Q")]
    pub q: f64,
    /// Semantic density `S_q`
    #[serde(rename = "S_q")]
    pub s_q: f64,
    /// Critical time `t`
    pub t: f64,
}

impl ScoreSample {
    /// Create a sample
    #[must_use]
    pub const fn new(q: f64, s_q: f64, t: f64) -> Self {
        Self { q, s_q, t }
    }

    /// Existence score `E = Q × S_q × t`
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotNumeric`] if any component is NaN
    pub fn existence(&self) -> Result<f64> {
        existence(self.q, self.s_q, self.t)
    }
}

/// Existence score `E = Q × S_q × t`
///
/// No domain restriction: any finite inputs give exactly the product.
///
/// # Errors
///
/// Returns [`Error::NotNumeric`] if any input is NaN
pub fn existence(q: f64, s_q: f64, t: f64) -> Result<f64> {
    ensure_numeric(&[("Q", q), ("S_q", s_q), ("t", t)])?;
    Ok(q * s_q * t)
}

/// Mismatch `|E − Q|`
///
/// # Errors
///
/// Returns [`Error::NotNumeric`] if any input is NaN
pub fn mismatch(e: f64, q: f64) -> Result<f64> {
    ensure_numeric(&[("E", e), ("Q", q)])?;
    Ok((e - q).abs())
}

/// Semantic gravity `grv = por_freq × entropy`
///
/// # Errors
///
/// Returns [`Error::NotNumeric`] if any input is NaN
pub fn semantic_gravity(por_freq: f64, entropy: f64) -> Result<f64> {
    ensure_numeric(&[("por_freq", por_freq), ("entropy", entropy)])?;
    Ok(por_freq * entropy)
}

/// Collapse frequency `λ · e^(−λt)`
///
/// # Errors
///
/// Returns [`Error::NotNumeric`] for NaN inputs and [`Error::OutOfDomain`]
/// when `lambda` or `t` is negative
pub fn collapse_frequency(lambda: f64, t: f64) -> Result<f64> {
    ensure_numeric(&[("lambda", lambda), ("t", t)])?;
    ensure_non_negative("lambda", lambda)?;
    ensure_non_negative("t", t)?;
    Ok(lambda * (-lambda * t).exp())
}

/// Phase gradient, two-argument form `E · S`
///
/// # Errors
///
/// Returns [`Error::NotNumeric`] for NaN inputs and [`Error::OutOfDomain`]
/// when `s` is negative
pub fn phase_gradient(e: f64, s: f64) -> Result<f64> {
    ensure_numeric(&[("E", e), ("S", s)])?;
    ensure_non_negative("S", s)?;
    Ok(e * s)
}

/// Phase gradient, scaled form `dΦ/dt = k · E · S^γ`
///
/// # Errors
///
/// Returns [`Error::NotNumeric`] for NaN inputs and [`Error::OutOfDomain`]
/// when `s` is negative
pub fn phase_gradient_scaled(e: f64, s: f64, k: f64, gamma: f64) -> Result<f64> {
    ensure_numeric(&[("E", e), ("S", s), ("k", k), ("gamma", gamma)])?;
    ensure_non_negative("S", s)?;
    Ok(k * e * s.powf(gamma))
}

/// Self-coherence `φ_C = ref_flow / (|ΔI_in| + |ΔI_out|)`
///
/// # Errors
///
/// Returns [`Error::NotNumeric`] for NaN inputs and [`Error::DivisionByZero`]
/// when both deltas are zero
pub fn self_coherence(reference_flow: f64, delta_in: f64, delta_out: f64) -> Result<f64> {
    ensure_numeric(&[
        ("reference_flow", reference_flow),
        ("delta_in", delta_in),
        ("delta_out", delta_out),
    ])?;
    let denominator = delta_in.abs() + delta_out.abs();
    if denominator == 0.0 {
        return Err(Error::DivisionByZero(
            "|delta_in| + |delta_out| must not be zero".to_string(),
        ));
    }
    Ok(reference_flow / denominator)
}

/// Gravity tensor `Σ Aᵢ·Bᵢ`
///
/// Empty vectors give `0.0`.
///
/// # Errors
///
/// Returns [`Error::LengthMismatch`] when the vectors differ in length and
/// [`Error::NotNumeric`] for NaN elements
pub fn gravity_tensor(a: &[f64], b: &[f64]) -> Result<f64> {
    ensure_same_len(a.len(), b.len())?;
    ensure_numeric_slice("A", a)?;
    ensure_numeric_slice("B", b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Evolution index `Σ Qᵢ·Sᵢ·tᵢ`
///
/// # Errors
///
/// Returns [`Error::LengthMismatch`] when the vectors differ in length and
/// [`Error::NotNumeric`] for NaN elements
pub fn evolution_index(q: &[f64], s: &[f64], t: &[f64]) -> Result<f64> {
    ensure_same_len(q.len(), s.len())?;
    ensure_same_len(q.len(), t.len())?;
    ensure_numeric_slice("Q", q)?;
    ensure_numeric_slice("S", s)?;
    ensure_numeric_slice("t", t)?;
    Ok(q
        .iter()
        .zip(s)
        .zip(t)
        .map(|((qi, si), ti)| qi * si * ti)
        .sum())
}

/// Firing decision `(I_q · E_m) / (R_def + 1) > θ`
///
/// # Errors
///
/// Returns [`Error::NotNumeric`] if any input is NaN
pub fn firing_probability(i_q: f64, e_m: f64, r_def: f64, theta: f64) -> Result<bool> {
    ensure_numeric(&[("I_q", i_q), ("E_m", e_m), ("R_def", r_def), ("theta", theta)])?;
    Ok((i_q * e_m) / (r_def + 1.0) > theta)
}

/// Energy gap between two firings `|E₁ − E₂|`
///
/// # Errors
///
/// Returns [`Error::NotNumeric`] if any input is NaN
pub fn refire_difference(e1: f64, e2: f64) -> Result<f64> {
    ensure_numeric(&[("E1", e1), ("E2", e2)])?;
    Ok((e1 - e2).abs())
}

/// Self-PoR score `E_self = E_base + ΔE_over × Q_self_factor`
///
/// # Errors
///
/// Returns [`Error::NotNumeric`] if any input is NaN
pub fn self_por_score(e_base: f64, delta_e_over: f64, q_self_factor: f64) -> Result<f64> {
    ensure_numeric(&[
        ("E_base", e_base),
        ("delta_E_over", delta_e_over),
        ("Q_self_factor", q_self_factor),
    ])?;
    Ok(delta_e_over.mul_add(q_self_factor, e_base))
}

/// Result of [`por_trigger`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerOutcome {
    /// `score >= theta`
    pub fired: bool,
    /// `E′ × φ_C × (1 − D)`
    pub score: f64,
}

/// Trigger condition `E′ × φ_C × (1 − D) >= θ`
///
/// # Errors
///
/// Returns [`Error::NotNumeric`] if any input is NaN
pub fn por_trigger(e_prime: f64, phi_c: f64, distance: f64, theta: f64) -> Result<TriggerOutcome> {
    ensure_numeric(&[
        ("E_prime", e_prime),
        ("phi_C", phi_c),
        ("D", distance),
        ("theta", theta),
    ])?;
    let score = e_prime * phi_c * (1.0 - distance);
    Ok(TriggerOutcome {
        fired: score >= theta,
        score,
    })
}

/// Logistic `1 / (1 + e^(−x))`
///
/// Very negative `x` saturates to `0.0` instead of overflowing.
///
/// # Errors
///
/// Returns [`Error::NotNumeric`] if `x` is NaN
pub fn sigmoid(x: f64) -> Result<f64> {
    ensure_numeric(&[("x", x)])?;
    Ok(1.0 / (1.0 + (-x).exp()))
}
