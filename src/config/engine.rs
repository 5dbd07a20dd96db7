//! # Engine Configuration
//!
//! Engine-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_BACKOFF_MAX_MINUTES, DEFAULT_BACKOFF_MIN_MINUTES, DEFAULT_FIELD_MANAGER,
    DEFAULT_RESYNC_INTERVAL_SECS,
};
use crate::manifests::ResourceKind;
use std::time::Duration;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("text") {
            LogFormat::Text
        } else {
            LogFormat::Json
        }
    }
}

/// Operator feature gates
///
/// Gates decide which conditionally created kinds exist in the cluster at all,
/// and therefore which kinds the pruner has to inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureGates {
    /// Prometheus operator CRDs (ServiceMonitor, PrometheusRule) are installed
    pub prometheus_operator: bool,
    /// Running on OpenShift, Routes are available
    pub openshift_routes: bool,
    /// Grafana operator CRDs (GrafanaDatasource) are installed
    pub grafana_operator: bool,
}

impl FeatureGates {
    /// Conditionally created kinds the pruner must list for these gates
    ///
    /// Ingress is always considered; the remaining kinds only exist when the
    /// owning operator's CRDs are installed.
    #[must_use]
    pub fn prunable_kinds(&self) -> Vec<ResourceKind> {
        let mut kinds = vec![ResourceKind::Ingress];
        if self.prometheus_operator {
            kinds.push(ResourceKind::ServiceMonitor);
            kinds.push(ResourceKind::PrometheusRule);
        }
        if self.openshift_routes {
            kinds.push(ResourceKind::Route);
        }
        if self.grafana_operator {
            kinds.push(ResourceKind::GrafanaDatasource);
        }
        kinds
    }
}

/// Engine-level configuration
///
/// All settings have defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Field manager recorded on create/update calls
    pub field_manager: String,
    /// Fibonacci backoff minimum (minutes)
    pub backoff_min_minutes: u64,
    /// Fibonacci backoff maximum (minutes)
    pub backoff_max_minutes: u64,
    /// Requeue interval after a clean reconciliation (seconds)
    pub resync_interval_secs: u64,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: LogFormat,
    /// Enable metrics collection
    pub enable_metrics: bool,
    /// Operator feature gates
    pub features: FeatureGates,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            backoff_min_minutes: DEFAULT_BACKOFF_MIN_MINUTES,
            backoff_max_minutes: DEFAULT_BACKOFF_MAX_MINUTES,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            log_level: "INFO".to_string(),
            log_format: LogFormat::Json,
            enable_metrics: true,
            features: FeatureGates::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            field_manager: env_var_or_default_str("FIELD_MANAGER", DEFAULT_FIELD_MANAGER),
            backoff_min_minutes: env_var_or_default(
                "BACKOFF_MIN_MINUTES",
                DEFAULT_BACKOFF_MIN_MINUTES,
            ),
            backoff_max_minutes: env_var_or_default(
                "BACKOFF_MAX_MINUTES",
                DEFAULT_BACKOFF_MAX_MINUTES,
            ),
            resync_interval_secs: env_var_or_default(
                "RESYNC_INTERVAL_SECS",
                DEFAULT_RESYNC_INTERVAL_SECS,
            ),
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
            log_format: LogFormat::parse(&env_var_or_default_str("LOG_FORMAT", "json")),
            enable_metrics: env_var_or_default_bool("ENABLE_METRICS", true),
            features: FeatureGates {
                prometheus_operator: env_var_or_default_bool("FEATURE_PROMETHEUS_OPERATOR", false),
                openshift_routes: env_var_or_default_bool("FEATURE_OPENSHIFT_ROUTES", false),
                grafana_operator: env_var_or_default_bool("FEATURE_GRAFANA_OPERATOR", false),
            },
        }
    }

    /// Get resync interval duration
    #[must_use]
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prunable_kinds_without_gates() {
        let kinds = FeatureGates::default().prunable_kinds();
        assert_eq!(kinds, vec![ResourceKind::Ingress]);
    }

    #[test]
    fn test_prunable_kinds_with_all_gates() {
        let gates = FeatureGates {
            prometheus_operator: true,
            openshift_routes: true,
            grafana_operator: true,
        };
        assert_eq!(
            gates.prunable_kinds(),
            vec![
                ResourceKind::Ingress,
                ResourceKind::ServiceMonitor,
                ResourceKind::PrometheusRule,
                ResourceKind::Route,
                ResourceKind::GrafanaDatasource,
            ]
        );
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("TEXT"), LogFormat::Text);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Json);
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.field_manager, "tempo-operator");
        assert_eq!(config.resync_interval(), Duration::from_secs(300));
    }
}
