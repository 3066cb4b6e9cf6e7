use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::Application;

pub const MAX_RISK_SCORE: u8 = 100;

/// Weights for the stored per-application score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskScoringPolicy {
    /// Declared monthly income above this is unusual for the scheme's target group.
    pub income_threshold: u64,
    pub high_income_points: u32,
    pub points_per_rejection: u32,
    pub points_per_unverified_document: u32,
}

impl Default for RiskScoringPolicy {
    fn default() -> Self {
        Self {
            income_threshold: 10_000,
            high_income_points: 20,
            points_per_rejection: 10,
            points_per_unverified_document: 15,
        }
    }
}

/// Derives the 0-100 score stored on every application write.
#[derive(Debug, Clone, Default)]
pub struct ApplicationRiskScorer {
    policy: RiskScoringPolicy,
}

impl ApplicationRiskScorer {
    pub fn new(policy: RiskScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn compute_risk_score(&self, application: &Application) -> u8 {
        let policy = &self.policy;
        let mut score: u32 = 0;

        if application.application_data.monthly_income > policy.income_threshold {
            score = score.saturating_add(policy.high_income_points);
        }

        score = score.saturating_add(
            policy
                .points_per_rejection
                .saturating_mul(saturating_u32(application.rejection_count())),
        );
        score = score.saturating_add(
            policy
                .points_per_unverified_document
                .saturating_mul(saturating_u32(application.unverified_document_count())),
        );

        score.min(u32::from(MAX_RISK_SCORE)) as u8
    }

    /// Recompute the stored score from scratch and stamp the write time.
    ///
    /// Must run immediately before every repository insert or update.
    pub fn before_save(&self, application: &mut Application, now: DateTime<Utc>) {
        application.risk_score = self.compute_risk_score(application);
        application.last_updated = now;
    }
}

fn saturating_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
