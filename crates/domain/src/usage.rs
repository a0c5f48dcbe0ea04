use serde::{Deserialize, Serialize};

/// Token usage for a single completion, as reported by the provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Aggregate usage for one orchestrated turn (one or two agent runs).
/// Used only for budget comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub requests: u32,
}

impl UsageStats {
    /// Count one model request and its (optional) token usage.
    pub fn record_request(&mut self, usage: Option<&Usage>) {
        self.requests += 1;
        if let Some(u) = usage {
            self.input_tokens += u64::from(u.prompt_tokens);
            self.output_tokens += u64::from(u.completion_tokens);
            self.total_tokens += u64::from(u.total_tokens);
        }
    }

    pub fn merge(&mut self, other: &UsageStats) {
        self.total_tokens += other.total_tokens;
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.requests += other.requests;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_request_without_usage_still_counts() {
        let mut stats = UsageStats::default();
        stats.record_request(None);
        stats.record_request(Some(&Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }));
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.total_tokens, 15);
        assert_eq!(stats.input_tokens, 10);
    }

    #[test]
    fn merge_sums_every_counter() {
        let mut a = UsageStats { total_tokens: 3, input_tokens: 2, output_tokens: 1, requests: 1 };
        let b = UsageStats { total_tokens: 7, input_tokens: 4, output_tokens: 3, requests: 2 };
        a.merge(&b);
        assert_eq!(a, UsageStats { total_tokens: 10, input_tokens: 6, output_tokens: 4, requests: 3 });
    }
}
