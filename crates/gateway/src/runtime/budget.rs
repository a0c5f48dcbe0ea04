//! Per-turn processing budget.
//!
//! A turn may run up to two agent runs. Their combined token usage and
//! model-request count are checked against [`BudgetConfig`] after each run;
//! once either limit is exceeded the turn stops and the visitor is asked to
//! rephrase.

use tg_domain::config::BudgetConfig;
use tg_domain::trace::TraceEvent;
use tg_domain::usage::UsageStats;

/// Returned when a budget check fails.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetExceeded {
    /// `"tokens"` or `"requests"`.
    pub kind: &'static str,
    pub used: u64,
    pub limit: u64,
}

impl std::fmt::Display for BudgetExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} budget exceeded ({} > {})", self.kind, self.used, self.limit)
    }
}

#[derive(Debug, Clone)]
pub struct TurnBudget {
    config: BudgetConfig,
}

impl TurnBudget {
    pub fn new(config: BudgetConfig) -> Self {
        Self { config }
    }

    /// `Ok` while `usage` is within both limits.
    pub fn check(&self, usage: &UsageStats) -> Result<(), BudgetExceeded> {
        let exceeded = if usage.total_tokens > self.config.max_total_tokens {
            Some(BudgetExceeded {
                kind: "tokens",
                used: usage.total_tokens,
                limit: self.config.max_total_tokens,
            })
        } else if usage.requests > self.config.max_requests {
            Some(BudgetExceeded {
                kind: "requests",
                used: u64::from(usage.requests),
                limit: u64::from(self.config.max_requests),
            })
        } else {
            None
        };

        match exceeded {
            None => Ok(()),
            Some(e) => {
                TraceEvent::BudgetExceeded {
                    total_tokens: usage.total_tokens,
                    requests: usage.requests,
                    max_total_tokens: self.config.max_total_tokens,
                    max_requests: self.config.max_requests,
                }
                .emit();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget() -> TurnBudget {
        TurnBudget::new(BudgetConfig {
            max_total_tokens: 1000,
            max_requests: 4,
        })
    }

    fn usage(tokens: u64, requests: u32) -> UsageStats {
        UsageStats {
            total_tokens: tokens,
            requests,
            ..Default::default()
        }
    }

    #[test]
    fn at_limit_is_allowed() {
        assert!(budget().check(&usage(1000, 4)).is_ok());
    }

    #[test]
    fn tokens_over_limit() {
        let err = budget().check(&usage(1001, 1)).unwrap_err();
        assert_eq!(err.kind, "tokens");
        assert_eq!(err.used, 1001);
    }

    #[test]
    fn requests_over_limit() {
        let err = budget().check(&usage(10, 5)).unwrap_err();
        assert_eq!(err.kind, "requests");
        assert_eq!(err.limit, 4);
    }
}
