use super::common::*;
use crate::applications::domain::{Application, ApplicationStatus};
use crate::applications::risk::{ApplicationRiskScorer, RiskScoringPolicy, MAX_RISK_SCORE};
use proptest::prelude::*;

#[test]
fn modest_income_with_verified_documents_scores_zero() {
    let scorer = ApplicationRiskScorer::default();
    let application = scored_application(8_000, 0, 3, &[]);

    assert_eq!(scorer.compute_risk_score(&application), 0);
}

#[test]
fn income_threshold_is_strict() {
    let scorer = ApplicationRiskScorer::default();

    assert_eq!(
        scorer.compute_risk_score(&scored_application(10_000, 0, 0, &[])),
        0
    );
    assert_eq!(
        scorer.compute_risk_score(&scored_application(10_001, 0, 0, &[])),
        20
    );
}

#[test]
fn only_rejections_in_history_add_points() {
    let scorer = ApplicationRiskScorer::default();
    let application = scored_application(
        5_000,
        0,
        0,
        &[
            ApplicationStatus::Rejected,
            ApplicationStatus::UnderReview,
            ApplicationStatus::Rejected,
            ApplicationStatus::Approved,
        ],
    );

    assert_eq!(scorer.compute_risk_score(&application), 20);
}

#[test]
fn each_unverified_document_adds_fifteen() {
    let scorer = ApplicationRiskScorer::default();
    let application = scored_application(5_000, 3, 2, &[]);

    assert_eq!(scorer.compute_risk_score(&application), 45);
}

#[test]
fn combined_signals_clamp_at_one_hundred() {
    let scorer = ApplicationRiskScorer::default();
    let application = scored_application(50_000, 4, 0, &[ApplicationStatus::Rejected; 10]);

    assert_eq!(scorer.compute_risk_score(&application), MAX_RISK_SCORE);
}

#[test]
fn custom_policy_weights_are_honoured() {
    let scorer = ApplicationRiskScorer::new(RiskScoringPolicy {
        income_threshold: 2_000,
        high_income_points: 5,
        points_per_rejection: 1,
        points_per_unverified_document: 2,
    });
    let application = scored_application(3_000, 2, 0, &[ApplicationStatus::Rejected]);

    assert_eq!(scorer.compute_risk_score(&application), 10);
}

#[test]
fn before_save_overwrites_stale_score_and_stamps_last_updated() {
    let scorer = ApplicationRiskScorer::default();
    let mut application = scored_application(12_000, 1, 0, &[]);
    application.risk_score = 99;
    let saved_at = fixed_time(15);

    scorer.before_save(&mut application, saved_at);

    assert_eq!(application.risk_score(), 35);
    assert_eq!(application.last_updated(), saved_at);
    assert_eq!(application.submission_date, fixed_time(9));
}

#[test]
fn verifying_a_document_lowers_the_next_saved_score() {
    let scorer = ApplicationRiskScorer::default();
    let mut application = scored_application(5_000, 2, 0, &[]);
    scorer.before_save(&mut application, fixed_time(10));
    assert_eq!(application.risk_score(), 30);

    application.documents[0].verified = true;
    scorer.before_save(&mut application, fixed_time(11));

    assert_eq!(application.risk_score(), 15);
}

#[test]
fn rehydrated_record_is_rescored_on_save() {
    let scorer = ApplicationRiskScorer::default();
    let mut stored = serde_json::to_value(scored_application(5_000, 2, 0, &[])).expect("serialize");
    stored["risk_score"] = serde_json::json!(99);
    let mut application: Application = serde_json::from_value(stored).expect("deserialize");
    assert_eq!(application.risk_score(), 99);

    scorer.before_save(&mut application, fixed_time(12));

    assert_eq!(application.risk_score(), 30);
    assert_eq!(application.last_updated(), fixed_time(12));
}

fn history(rejections: usize, others: usize) -> Vec<ApplicationStatus> {
    std::iter::repeat(ApplicationStatus::Rejected)
        .take(rejections)
        .chain(std::iter::repeat(ApplicationStatus::UnderReview).take(others))
        .collect()
}

proptest! {
    #[test]
    fn score_is_bounded_and_deterministic(
        income in 0u64..60_000,
        unverified in 0usize..12,
        verified in 0usize..6,
        rejections in 0usize..20,
        others in 0usize..5,
    ) {
        let scorer = ApplicationRiskScorer::default();
        let application = scored_application(income, unverified, verified, &history(rejections, others));

        let first = scorer.compute_risk_score(&application);
        prop_assert!(first <= MAX_RISK_SCORE);
        prop_assert_eq!(first, scorer.compute_risk_score(&application));
    }

    #[test]
    fn adding_a_rejection_never_lowers_the_score(
        income in 0u64..60_000,
        unverified in 0usize..8,
        rejections in 0usize..12,
    ) {
        let scorer = ApplicationRiskScorer::default();
        let before = scored_application(income, unverified, 0, &history(rejections, 0));
        let after = scored_application(income, unverified, 0, &history(rejections + 1, 0));

        prop_assert!(scorer.compute_risk_score(&after) >= scorer.compute_risk_score(&before));
    }

    #[test]
    fn verifying_a_document_never_raises_the_score(
        income in 0u64..60_000,
        unverified in 1usize..8,
        rejections in 0usize..12,
    ) {
        let scorer = ApplicationRiskScorer::default();
        let before = scored_application(income, unverified, 0, &history(rejections, 0));
        let after = scored_application(income, unverified - 1, 1, &history(rejections, 0));

        prop_assert!(scorer.compute_risk_score(&after) <= scorer.compute_risk_score(&before));
    }
}
