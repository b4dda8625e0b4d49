use serde::{Deserialize, Serialize};

/// Span export settings.
///
/// Structured JSON logs are always on.  Setting `otlp_endpoint` additionally
/// forwards every `tracing` span (`pull`, `challenge.verify`, `rate_limit`,
/// `reward.tier`) to an OTLP/gRPC collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// OTLP gRPC endpoint (e.g. `http://localhost:4317`).
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    /// The `service.name` resource attribute reported to the collector.
    #[serde(default = "d_service_name")]
    pub service_name: String,

    /// Trace sampling rate (`0.0` = never, `1.0` = always).
    #[serde(default = "d_sample_rate")]
    pub sample_rate: f64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: d_service_name(),
            sample_rate: d_sample_rate(),
        }
    }
}

fn d_service_name() -> String {
    "gachagate".into()
}

fn d_sample_rate() -> f64 {
    1.0
}
