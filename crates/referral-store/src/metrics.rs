//! Pure, I/O-free summarizers over a [`ReconciledMap`]: the aggregate
//! dashboard metrics and the data-quality ranking.

use referral_core::{ReferralId, Status};
use serde::{Deserialize, Serialize};

use crate::types::{ReconciledMap, ReferralMetrics};

/// Referral counts derived from a reconciled map, as returned alongside
/// every upload response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetrics {
    pub total: u32,
    pub completed: u32,
    pub cancelled: u32,
    pub in_progress: u32,
    pub scheduled: u32,
    pub no_appointment: u32,
}

/// Compute the aggregate dashboard counts over every referral in `map`.
#[must_use]
pub fn aggregate_metrics(map: &ReconciledMap) -> AggregateMetrics {
    let total = map.len() as u32;
    let completed = count_status(map, Status::Completed);
    let cancelled = count_status(map, Status::Cancelled);
    let in_progress = total - completed - cancelled;
    let scheduled = map
        .values()
        .filter(|r| !matches!(r.status, Status::Completed | Status::Cancelled))
        .filter(|r| r.active_appointment.is_some())
        .count() as u32;
    let no_appointment = in_progress - scheduled;

    AggregateMetrics {
        total,
        completed,
        cancelled,
        in_progress,
        scheduled,
        no_appointment,
    }
}

fn count_status(map: &ReconciledMap, status: Status) -> u32 {
    map.values().filter(|r| r.status == status).count() as u32
}

/// One row of the data-quality ranking: a referral and the per-referral
/// counters that produced its score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityRankingEntry {
    pub referral_id: ReferralId,
    pub score: u32,
    pub metrics: ReferralMetrics,
}

/// Sum of every per-referral counter across `map`, plus the top 10 referrals
/// ranked by `score = duplicates + seq_gaps + 2*terminal_overrides`
/// (descending, ties broken by ascending `referral_id`), excluding any
/// referral whose score is zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQualitySummary {
    pub totals: ReferralMetrics,
    pub top_offenders: Vec<QualityRankingEntry>,
}

/// Compute the data-quality summary over every referral in `map`.
#[must_use]
pub fn data_quality_summary(map: &ReconciledMap) -> DataQualitySummary {
    let mut totals = ReferralMetrics::default();
    for state in map.values() {
        totals.duplicates += state.metrics.duplicates;
        totals.seq_gaps += state.metrics.seq_gaps;
        totals.terminal_overrides += state.metrics.terminal_overrides;
        totals.reschedules += state.metrics.reschedules;
        totals.cancelled_appts += state.metrics.cancelled_appts;
    }

    let mut ranked: Vec<QualityRankingEntry> = map
        .values()
        .map(|state| QualityRankingEntry {
            referral_id: state.referral_id.clone(),
            score: score(&state.metrics),
            metrics: state.metrics,
        })
        .filter(|entry| entry.score > 0)
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.referral_id.cmp(&b.referral_id)));
    ranked.truncate(10);

    DataQualitySummary {
        totals,
        top_offenders: ranked,
    }
}

fn score(metrics: &ReferralMetrics) -> u32 {
    metrics.duplicates + metrics.seq_gaps + 2 * metrics.terminal_overrides
}
