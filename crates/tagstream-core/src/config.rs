use crate::app_config::AppConfig;
use crate::record::Platform;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The parsing/validation logic is decoupled from the actual environment so
/// tests can drive it with a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let api_key = require("TAGSTREAM_API_KEY")?;
    let api_base_url = or_default("TAGSTREAM_API_BASE_URL", "https://api.tikhub.io");

    let bind_addr = parse_addr("TAGSTREAM_BIND_ADDR", "0.0.0.0:8001")?;
    let log_level = or_default("TAGSTREAM_LOG_LEVEL", "info");

    let tags = parse_list(&or_default("TAGSTREAM_TAGS", "music,dance"));
    if tags.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "TAGSTREAM_TAGS".to_string(),
            reason: "must contain at least one tag".to_string(),
        });
    }

    let limit = parse_usize("TAGSTREAM_LIMIT", "20")?;

    // LinkedIn is off by default; its search capability is people, not posts.
    let platform_keys = parse_list(&or_default(
        "TAGSTREAM_PLATFORMS",
        "tiktok,instagram,twitter,youtube,reddit",
    ));
    let mut enabled_platforms = Vec::with_capacity(platform_keys.len());
    for key in &platform_keys {
        let platform = key
            .parse::<Platform>()
            .map_err(|reason| ConfigError::InvalidEnvVar {
                var: "TAGSTREAM_PLATFORMS".to_string(),
                reason,
            })?;
        if !enabled_platforms.contains(&platform) {
            enabled_platforms.push(platform);
        }
    }
    if enabled_platforms.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "TAGSTREAM_PLATFORMS".to_string(),
            reason: "must enable at least one platform".to_string(),
        });
    }

    let request_timeout_secs = parse_u64("TAGSTREAM_REQUEST_TIMEOUT_SECS", "30")?;
    let request_delay_ms = parse_u64("TAGSTREAM_REQUEST_DELAY_MS", "500")?;
    let max_attempts = parse_u32("TAGSTREAM_MAX_ATTEMPTS", "3")?;
    if max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TAGSTREAM_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let output_dir = PathBuf::from(or_default("TAGSTREAM_OUTPUT_DIR", "./output"));

    Ok(AppConfig {
        api_base_url,
        api_key,
        bind_addr,
        log_level,
        tags,
        limit,
        enabled_platforms,
        request_timeout_secs,
        request_delay_ms,
        max_attempts,
        output_dir,
    })
}

/// Split a comma-separated list, trimming entries and dropping empties.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    /// Returns a map with all required env vars populated with valid values.
    fn full_env<'a>() -> HashMap<&'a str, &'a str> {
        let mut m = HashMap::new();
        m.insert("TAGSTREAM_API_KEY", "test-key");
        m
    }

    #[test]
    fn build_app_config_fails_without_api_key() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "TAGSTREAM_API_KEY"),
            "expected MissingEnvVar(TAGSTREAM_API_KEY), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_succeeds_with_defaults() {
        let cfg = build_app_config(lookup_from_map(&full_env())).unwrap();
        assert_eq!(cfg.api_base_url, "https://api.tikhub.io");
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:8001");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.tags, vec!["music", "dance"]);
        assert_eq!(cfg.limit, 20);
        assert_eq!(
            cfg.enabled_platforms,
            vec![
                Platform::Tiktok,
                Platform::Instagram,
                Platform::Twitter,
                Platform::Youtube,
                Platform::Reddit
            ]
        );
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.request_delay_ms, 500);
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.output_dir.to_string_lossy(), "./output");
    }

    #[test]
    fn build_app_config_fails_with_invalid_bind_addr() {
        let mut map = full_env();
        map.insert("TAGSTREAM_BIND_ADDR", "not-a-socket-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TAGSTREAM_BIND_ADDR"),
            "expected InvalidEnvVar(TAGSTREAM_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn tags_list_trims_and_drops_empty_entries() {
        let mut map = full_env();
        map.insert("TAGSTREAM_TAGS", " music , dance ,,fitness");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.tags, vec!["music", "dance", "fitness"]);
    }

    #[test]
    fn empty_tags_list_is_rejected() {
        let mut map = full_env();
        map.insert("TAGSTREAM_TAGS", " , ");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TAGSTREAM_TAGS"),
            "expected InvalidEnvVar(TAGSTREAM_TAGS), got: {result:?}"
        );
    }

    #[test]
    fn platforms_parse_and_dedupe() {
        let mut map = full_env();
        map.insert("TAGSTREAM_PLATFORMS", "tiktok,Reddit,tiktok");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(
            cfg.enabled_platforms,
            vec![Platform::Tiktok, Platform::Reddit]
        );
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let mut map = full_env();
        map.insert("TAGSTREAM_PLATFORMS", "tiktok,myspace");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TAGSTREAM_PLATFORMS"),
            "expected InvalidEnvVar(TAGSTREAM_PLATFORMS), got: {result:?}"
        );
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        let mut map = full_env();
        map.insert("TAGSTREAM_MAX_ATTEMPTS", "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TAGSTREAM_MAX_ATTEMPTS"),
            "expected InvalidEnvVar(TAGSTREAM_MAX_ATTEMPTS), got: {result:?}"
        );
    }

    #[test]
    fn numeric_overrides_apply() {
        let mut map = full_env();
        map.insert("TAGSTREAM_LIMIT", "50");
        map.insert("TAGSTREAM_REQUEST_DELAY_MS", "250");
        map.insert("TAGSTREAM_MAX_ATTEMPTS", "5");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.limit, 50);
        assert_eq!(cfg.request_delay_ms, 250);
        assert_eq!(cfg.max_attempts, 5);
    }

    #[test]
    fn invalid_numeric_value_is_rejected() {
        let mut map = full_env();
        map.insert("TAGSTREAM_REQUEST_TIMEOUT_SECS", "not-a-number");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TAGSTREAM_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar(TAGSTREAM_REQUEST_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let cfg = build_app_config(lookup_from_map(&full_env())).unwrap();
        let debug = format!("{cfg:?}");
        assert!(debug.contains("[redacted]"));
        assert!(!debug.contains("test-key"));
    }
}
