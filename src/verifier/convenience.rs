//! Thin, opinionated wrappers over [`super::Verifier::verify`] for the
//! questions most callers actually ask.

use std::collections::HashMap;

use super::result::VerificationResult;
use crate::vc::VcType;

/// `true` iff the result is valid and discloses `ageOver21 == true`.
#[must_use]
pub fn is_age_21_plus(result: &VerificationResult) -> bool {
    result.is_valid && result.attribute_is_true("ageOver21")
}

/// `true` iff the result is valid and discloses `ageOver18 == true`.
#[must_use]
pub fn is_age_18_plus(result: &VerificationResult) -> bool {
    result.is_valid && result.attribute_is_true("ageOver18")
}

/// `true` iff the result is valid and discloses `verifiedHuman == true`.
#[must_use]
pub fn is_verified_human(result: &VerificationResult) -> bool {
    result.is_valid && result.attribute_is_true("verifiedHuman")
}

/// A weighted sum over the distinct, `Active` VC types a verification
/// presented, using caller-supplied per-type weights. Types absent from
/// `weights` contribute nothing. `None` for an invalid result — weights and
/// ranges are policy, not crypto, so there is no meaningful score to report.
#[must_use]
pub fn get_aura_score(result: &VerificationResult, weights: &HashMap<VcType, f64>) -> Option<f64> {
    if !result.is_valid {
        return None;
    }
    Some(
        result
            .vc_details
            .iter()
            .filter(|detail| detail.status.is_active())
            .filter_map(|detail| detail.vc_type)
            .map(|vc_type| weights.get(&vc_type).copied().unwrap_or(0.0))
            .sum(),
    )
}
