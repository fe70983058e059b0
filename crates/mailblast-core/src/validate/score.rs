//! Signal weighting and verdict thresholds.
//!
//! The score is an additive, clamped combination of the check outcomes;
//! the verdict is derived from the score alone (plus the two definitive
//! short-circuits handled in the engine), so the two can never disagree.

use crate::config::ValidationConfig;

use super::verdict::{Checks, Verdict};

/// Weight for a resolvable mail route.
const W_ROUTE: f64 = 0.55;
/// Bonus for an address with no risk signals.
const W_CLEAN: f64 = 0.25;
/// Penalty for a disposable-provider domain.
const W_DISPOSABLE: f64 = 0.15;
/// Penalty for a role-account local part.
const W_ROLE: f64 = 0.10;
/// Bonus for a live probe that accepted the recipient.
const W_PROBE_ACCEPT: f64 = 0.20;

/// Combines check outcomes into a score in `[0.0, 1.0]`.
///
/// A disposable domain can never reach the valid band: its ceiling is
/// `W_ROUTE - W_DISPOSABLE + W_PROBE_ACCEPT = 0.60`.
#[must_use]
pub fn score(checks: &Checks) -> f64 {
    if !checks.syntax_ok || !checks.has_mx_or_a_record {
        return 0.0;
    }

    let mut score = W_ROUTE;
    if checks.is_disposable {
        score -= W_DISPOSABLE;
    }
    if checks.is_role_account {
        score -= W_ROLE;
    }
    if !checks.is_disposable && !checks.is_role_account {
        score += W_CLEAN;
    }
    if checks.smtp_accepts == Some(true) {
        score += W_PROBE_ACCEPT;
    }

    score.clamp(0.0, 1.0)
}

/// Maps a score to its verdict band.
#[must_use]
pub fn verdict_for(score: f64, config: &ValidationConfig) -> Verdict {
    if score >= config.score_high {
        Verdict::Valid
    } else if score < config.score_low {
        Verdict::Invalid
    } else {
        Verdict::Risky
    }
}

/// Score assigned to indeterminate outcomes, pinned to the bottom of the
/// risky band so the verdict ordering (valid > risky > unknown > invalid)
/// holds numerically.
#[must_use]
pub const fn unknown_score(config: &ValidationConfig) -> f64 {
    config.score_low
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checks(route: bool) -> Checks {
        Checks {
            syntax_ok: true,
            has_mx_or_a_record: route,
            ..Checks::default()
        }
    }

    #[test]
    fn no_route_scores_zero() {
        assert_eq!(score(&checks(false)), 0.0);
        assert_eq!(score(&Checks::default()), 0.0);
    }

    #[test]
    fn clean_routed_address_is_valid() {
        let config = ValidationConfig::default();
        let s = score(&checks(true));
        assert!((s - 0.80).abs() < f64::EPSILON);
        assert_eq!(verdict_for(s, &config), Verdict::Valid);
    }

    #[test]
    fn probe_acceptance_is_additive() {
        let mut c = checks(true);
        c.smtp_accepts = Some(true);
        assert!((score(&c) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn disposable_never_reaches_valid_band() {
        let config = ValidationConfig::default();
        let mut c = checks(true);
        c.is_disposable = true;
        c.smtp_accepts = Some(true);
        let s = score(&c);
        assert!(s < config.score_high);
        assert_eq!(verdict_for(s, &config), Verdict::Risky);
    }

    #[test]
    fn role_account_lands_risky() {
        let config = ValidationConfig::default();
        let mut c = checks(true);
        c.is_role_account = true;
        let s = score(&c);
        assert_eq!(verdict_for(s, &config), Verdict::Risky);
    }

    #[test]
    fn score_bands_respect_verdict_ordering() {
        let config = ValidationConfig::default();
        let valid = score(&checks(true));
        let mut risky_checks = checks(true);
        risky_checks.is_disposable = true;
        let risky = score(&risky_checks);
        let unknown = unknown_score(&config);
        let invalid = score(&checks(false));

        assert!(valid > risky);
        assert!(risky > unknown);
        assert!(unknown > invalid);
    }
}
