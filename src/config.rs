use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::constants::DEFAULT_NATIVE_LANG;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub catalog_dir: String,
    pub cors_origin: String,
    pub engine: EngineEnvConfig,
}

/// Engine tuning knobs that may be overridden from the environment. The rest
/// of the engine configuration keeps its defaults.
#[derive(Debug, Clone)]
pub struct EngineEnvConfig {
    pub default_native_lang: String,
    pub group_unlock_threshold: f64,
    pub level_unlock_threshold: f64,
    pub mc_choice_count: usize,
    pub misspell_reclaim_factor: f64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/progress.sled"),
            catalog_dir: env_or("CATALOG_DIR", "./catalog"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            engine: EngineEnvConfig {
                default_native_lang: env_or("DEFAULT_NATIVE_LANG", DEFAULT_NATIVE_LANG),
                group_unlock_threshold: env_or_parse("GROUP_UNLOCK_THRESHOLD", 50.0_f64),
                level_unlock_threshold: env_or_parse("LEVEL_UNLOCK_THRESHOLD", 50.0_f64),
                mc_choice_count: env_or_parse("MC_CHOICE_COUNT", 4_usize),
                misspell_reclaim_factor: env_or_parse("MISSPELL_RECLAIM_FACTOR", 0.5_f64),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                tracing::warn!(key, value = %raw, "Unrecognized boolean env var, using default");
                default
            }
        },
        Err(_) => default,
    }
}
