use serde::Serialize;

/// Structured trace events emitted by the pull pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    PullServed {
        session_id: String,
        draws: usize,
        tickets: usize,
        tiers: usize,
    },
    PullRejected {
        session_id: Option<String>,
        reason: String,
    },
    ChallengeChecked {
        success: bool,
        duration_ms: u64,
        error_codes: Vec<String>,
    },
    QuotaRejected {
        limiter: String,
        retry_after_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "gacha_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged() {
        let event = TraceEvent::QuotaRejected {
            limiter: "uid".into(),
            retry_after_ms: 1200,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "QuotaRejected");
        assert_eq!(json["limiter"], "uid");
    }
}
