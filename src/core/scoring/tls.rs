// src/core/scoring/tls.rs

use chrono::{DateTime, Utc};

use super::TLS_GRADES;
use crate::core::models::TlsScanResult;

const BASE_SCORE: i32 = 5;
const MILLIS_PER_DAY: i64 = 86_400_000;

pub const EXPIRING_SOON: &str = "Certificate expires soon";
pub const UPGRADE_PROTOCOL: &str = "Upgrade to TLS 1.2+";

/// Whole days until `not_after`, rounded up. Negative once expired.
pub fn days_remaining(not_after: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = not_after.signed_duration_since(now).num_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) > 0 { days + 1 } else { days }
}

/// Scores a handshake from its negotiated protocol and certificate expiry.
///
/// Starts at 5. Fewer than 30 days left costs 2, more than 365 adds 1.
/// TLS 1.3 adds 2, TLS 1.2 adds 1, anything else (or nothing) costs 2. The
/// score is not clamped.
pub fn score_tls(protocol: Option<&str>, not_after: DateTime<Utc>, now: DateTime<Utc>) -> TlsScanResult {
    let mut score = BASE_SCORE;
    let mut recommendations = Vec::new();

    let days = days_remaining(not_after, now);
    if days < 30 {
        score -= 2;
        recommendations.push(EXPIRING_SOON.to_string());
    } else if days > 365 {
        score += 1;
    }

    match protocol {
        Some("TLSv1.3") => score += 2,
        Some("TLSv1.2") => score += 1,
        _ => {
            score -= 2;
            recommendations.push(UPGRADE_PROTOCOL.to_string());
        }
    }

    TlsScanResult { score, grade: TLS_GRADES.grade(score), recommendations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Grade;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn expiring_certificate_on_tls13_grades_c() {
        let result = score_tls(Some("TLSv1.3"), now() + Duration::days(29), now());
        assert_eq!(result.score, 5);
        assert_eq!(result.grade, Grade::C);
        assert_eq!(result.recommendations, vec![EXPIRING_SOON]);
    }

    #[test]
    fn long_lived_certificate_on_tls12_grades_b() {
        let result = score_tls(Some("TLSv1.2"), now() + Duration::days(400), now());
        assert_eq!(result.score, 7);
        assert_eq!(result.grade, Grade::B);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn legacy_protocol_grades_d() {
        let result = score_tls(Some("TLSv1.0"), now() + Duration::days(90), now());
        assert_eq!(result.score, 3);
        assert_eq!(result.grade, Grade::D);
        assert_eq!(result.recommendations, vec![UPGRADE_PROTOCOL]);
    }

    #[test]
    fn unknown_protocol_counts_as_legacy() {
        let result = score_tls(None, now() + Duration::days(10), now());
        assert_eq!(result.score, 1);
        assert_eq!(result.grade, Grade::F);
        assert_eq!(result.recommendations, vec![EXPIRING_SOON, UPGRADE_PROTOCOL]);
    }

    #[test]
    fn best_case_reaches_eight() {
        let result = score_tls(Some("TLSv1.3"), now() + Duration::days(500), now());
        assert_eq!(result.score, 8);
        assert_eq!(result.grade, Grade::A);
    }

    #[test]
    fn thirty_to_three_sixty_five_days_is_neutral() {
        for days in [30, 200, 365] {
            let result = score_tls(Some("TLSv1.2"), now() + Duration::days(days), now());
            assert_eq!(result.score, 6, "{days} days");
        }
    }

    #[test]
    fn partial_days_round_up() {
        // 29 days and one hour left counts as 30.
        let not_after = now() + Duration::days(29) + Duration::hours(1);
        assert_eq!(days_remaining(not_after, now()), 30);
        assert_eq!(score_tls(Some("TLSv1.3"), not_after, now()).score, 7);

        // 365 days and a minute counts as 366.
        let not_after = now() + Duration::days(365) + Duration::minutes(1);
        assert_eq!(days_remaining(not_after, now()), 366);

        let expired = now() - Duration::hours(36);
        assert_eq!(days_remaining(expired, now()), -1);
    }

    #[test]
    fn scoring_is_idempotent() {
        let not_after = now() + Duration::days(45);
        assert_eq!(
            score_tls(Some("TLSv1.2"), not_after, now()),
            score_tls(Some("TLSv1.2"), not_after, now())
        );
    }
}
