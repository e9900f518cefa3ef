use crate::{AggregateStats, UsageLog};

/// Totals recomputed from a slice of logs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogTotals {
    pub request_count: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
}

impl LogTotals {
    /// Token counts come from the server and saturate instead of wrapping.
    fn add_log(&mut self, log: &UsageLog) {
        self.request_count = self.request_count.saturating_add(1);
        self.prompt_tokens = self.prompt_tokens.saturating_add(log.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(log.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(log.total_tokens);
        self.total_cost += log.estimated_cost;
    }
}

/// Sum every log in the slice. Counts saturate at `u64::MAX`.
pub fn totals(logs: &[UsageLog]) -> LogTotals {
    let mut totals = LogTotals::default();
    for log in logs {
        totals.add_log(log);
    }
    totals
}

/// Server stats disagree with the logs they were fetched alongside.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Inconsistency {
    #[error("stats report {reported} total tokens but logs sum to {summed}")]
    Mismatch { reported: u64, summed: u64 },

    #[error("log token counts overflow when summed")]
    Overflow,
}

/// Check that `stats.total_tokens` equals the sum over `logs`.
///
/// A sum that does not fit in `u64` can never match a reported total and
/// is rejected.
pub fn check_consistency(logs: &[UsageLog], stats: &AggregateStats) -> Result<(), Inconsistency> {
    let summed = logs
        .iter()
        .try_fold(0u64, |acc, log| acc.checked_add(log.total_tokens))
        .ok_or(Inconsistency::Overflow)?;
    if summed == stats.total_tokens {
        Ok(())
    } else {
        Err(Inconsistency::Mismatch {
            reported: stats.total_tokens,
            summed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn totals_empty() {
        assert_eq!(totals(&[]), LogTotals::default());
    }

    #[test]
    fn totals_sum_every_log() {
        let logs = vec![
            testing::log("a", 2, 100, 0.0002, 50),
            testing::log("b", 1, 50, 0.0001, 30),
        ];
        let t = totals(&logs);
        assert_eq!(t.request_count, 2);
        assert_eq!(t.total_tokens, 150);
        assert!((t.total_cost - 0.0003).abs() < 1e-12);
    }

    #[test]
    fn consistency_matches_summed_tokens() {
        let logs = vec![
            testing::log("a", 2, 100, 0.0002, 50),
            testing::log("b", 1, 50, 0.0001, 30),
        ];
        let mut stats = testing::stats_for(&logs);
        assert!(check_consistency(&logs, &stats).is_ok());

        stats.total_tokens = 151;
        assert_eq!(
            check_consistency(&logs, &stats),
            Err(Inconsistency::Mismatch {
                reported: 151,
                summed: 150
            })
        );
    }

    #[test]
    fn overflowing_log_tokens_are_rejected_not_wrapped() {
        let logs = vec![
            testing::log("a", 1, u64::MAX, 0.0, 10),
            testing::log("b", 0, 1, 0.0, 10),
        ];
        let stats = AggregateStats {
            total_tokens: 0,
            ..AggregateStats::default()
        };
        assert_eq!(check_consistency(&logs, &stats), Err(Inconsistency::Overflow));

        let stats = AggregateStats {
            total_tokens: u64::MAX,
            ..AggregateStats::default()
        };
        assert_eq!(check_consistency(&logs, &stats), Err(Inconsistency::Overflow));

        assert_eq!(totals(&logs).total_tokens, u64::MAX);
    }
}
