//! # secirc-trust
//!
//! Relay verification and trust scoring (§4.6). A verifier grades an
//! untrusted relay using six blind test families, then folds the
//! result into a decaying, weighted [`secirc_types::trust::TrustScore`].
//!
//! ## Modules
//!
//! - [`verification`] — runs the six test families and gates on
//!   `ProofOfRelay`
//! - [`scoring`] — applies verification results to a trust score and
//!   decays it over time

pub mod scoring;
pub mod verification;

/// Errors from relay verification and trust scoring.
#[derive(Debug, thiserror::Error)]
pub enum TrustError {
    #[error("score component '{name}' out of range [0,1]: {value}")]
    OutOfRange { name: &'static str, value: f64 },
    #[error("no verification results were supplied for this round")]
    EmptyRound,
}

pub type Result<T> = std::result::Result<T, TrustError>;
