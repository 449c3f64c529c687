//! Resolver configuration.
//!
//! Settings are read from the environment when the service is created:
//!
//! - `JVM_RS_RESOLVE_METRICS`: Collect resolution counters (`"1"`/`"true"`, default on)
//! - `JVM_RS_TRACE_LOOKUPS`: Emit one `debug!` event per method resolution (`"1"`/`"true"`)
use std::env;

pub const METRICS_ENV: &str = "JVM_RS_RESOLVE_METRICS";
pub const TRACE_LOOKUPS_ENV: &str = "JVM_RS_TRACE_LOOKUPS";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
    pub collect_metrics: bool,
    pub log_lookups: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            collect_metrics: true,
            log_lookups: false,
        }
    }
}

impl ResolverConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            collect_metrics: env::var(METRICS_ENV)
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.collect_metrics),
            log_lookups: env::var(TRACE_LOOKUPS_ENV)
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.log_lookups),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}
