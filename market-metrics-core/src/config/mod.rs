//! Dashboard configuration
//!
//! Values are layered with increasing priority:
//! 1. Compiled-in defaults passed to every lookup
//! 2. TOML file (default `config/config.toml`, optional)
//! 3. Environment variables prefixed `MARKET_METRICS_`, nested with `__`
//!    (e.g. `MARKET_METRICS_DASHBOARD__REFRESH__INTERVAL=500`)
//!
//! A lookup never fails: absent keys and unparseable values resolve to the
//! supplied default.

use crate::exchanges::MetricsResult;
use crate::io::{parse_exchanges, DEFAULT_EXCHANGES};
use crate::metrics::DEFAULT_HISTORY_CAPACITY;
use ::config::{Config, ConfigError, Environment, File, FileFormat, Value, ValueKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const ENV_PREFIX: &str = "MARKET_METRICS";

pub const KEY_EXCHANGES: &str = "exchanges";
pub const KEY_COLORS_ENABLED: &str = "dashboard.colors.enabled";
pub const KEY_REFRESH_INTERVAL: &str = "dashboard.refresh.interval";
pub const KEY_SPARKLINE_HISTORY: &str = "sparkline.max.history";
pub const KEY_CSV_ENABLED: &str = "export.csv.enabled";
pub const KEY_CSV_PATH: &str = "export.csv.path";
pub const KEY_SYMBOLS_PATH: &str = "symbols.path";

// ── Default value functions ────────────────────────────────────────────

fn default_refresh_interval_ms() -> i64 {
    1_000
}

fn default_sparkline_history() -> i64 {
    DEFAULT_HISTORY_CAPACITY as i64
}

fn default_csv_path() -> &'static str {
    "report/metrics.csv"
}

fn default_symbols_path() -> &'static str {
    "config/symbols.txt"
}

/// Key/value lookups with default fallback
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    inner: Config,
}

impl ConfigStore {
    /// Load `path` (if it exists) and the process environment.
    ///
    /// A malformed file is logged and ignored; the store then serves defaults
    /// and environment overrides only.
    pub fn load(path: impl AsRef<Path>) -> Self {
        Self::load_with_env(path, None)
    }

    /// Like [`ConfigStore::load`] but reading overrides from `env` instead of
    /// the process environment when given.
    pub fn load_with_env(path: impl AsRef<Path>, env: Option<HashMap<String, String>>) -> Self {
        let path = path.as_ref();
        match Self::build(Some(path), env.clone()) {
            Ok(inner) => Self { inner },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Config file unreadable, using defaults");
                let inner = Self::build(None, env).unwrap_or_default();
                Self { inner }
            }
        }
    }

    /// Store with no sources; every lookup returns its default
    pub fn empty() -> Self {
        Self::default()
    }

    fn build(path: Option<&Path>, env: Option<HashMap<String, String>>) -> MetricsResult<Config> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__");
        let environment = match env {
            Some(map) => environment.source(Some(map)),
            None => environment,
        };
        Ok(builder.add_source(environment).build()?)
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        Self::resolve(key, self.inner.get_string(key), default.to_string())
    }

    /// Integer lookup. Only whole numbers or strings of digits qualify;
    /// floats, booleans and words resolve to `default`.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        let value = self.raw(key).and_then(|value| match value.kind {
            ValueKind::I64(n) => Ok(n),
            ValueKind::U64(n) => i64::try_from(n).map_err(|_| invalid(key, "integer")),
            ValueKind::String(ref text) => text.trim().parse().map_err(|_| invalid(key, "integer")),
            _ => Err(invalid(key, "integer")),
        });
        Self::resolve(key, value, default)
    }

    /// Boolean lookup. Accepts `true`/`false` in any case; anything else
    /// resolves to `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        let value = self.raw(key).and_then(|value| match value.kind {
            ValueKind::Boolean(flag) => Ok(flag),
            ValueKind::String(ref text) if text.trim().eq_ignore_ascii_case("true") => Ok(true),
            ValueKind::String(ref text) if text.trim().eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(invalid(key, "boolean")),
        });
        Self::resolve(key, value, default)
    }

    fn raw(&self, key: &str) -> Result<Value, ConfigError> {
        self.inner.get::<Value>(key)
    }

    fn resolve<T: std::fmt::Debug>(key: &str, value: Result<T, ConfigError>, default: T) -> T {
        match value {
            Ok(value) => value,
            Err(ConfigError::NotFound(_)) => {
                debug!(key, ?default, "Config key absent, using default");
                default
            }
            Err(e) => {
                warn!(key, ?default, error = %e, "Config value invalid, using default");
                default
            }
        }
    }
}

/// Typed settings resolved from a [`ConfigStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub exchanges: Vec<String>,
    pub colors_enabled: bool,
    pub refresh_interval: Duration,
    /// Rolling price history length per symbol, also the sparkline width
    pub sparkline_history: usize,
    pub csv_enabled: bool,
    pub csv_path: PathBuf,
    pub symbols_path: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::from_store(&ConfigStore::empty())
    }
}

impl DashboardConfig {
    pub fn from_store(store: &ConfigStore) -> Self {
        let exchanges = parse_exchanges(&store.get_string(KEY_EXCHANGES, DEFAULT_EXCHANGES));

        let refresh_ms = positive_or_default(
            KEY_REFRESH_INTERVAL,
            store.get_int(KEY_REFRESH_INTERVAL, default_refresh_interval_ms()),
            default_refresh_interval_ms(),
        );
        let history = positive_or_default(
            KEY_SPARKLINE_HISTORY,
            store.get_int(KEY_SPARKLINE_HISTORY, default_sparkline_history()),
            default_sparkline_history(),
        );

        Self {
            exchanges,
            colors_enabled: store.get_bool(KEY_COLORS_ENABLED, true),
            refresh_interval: Duration::from_millis(refresh_ms as u64),
            sparkline_history: history as usize,
            csv_enabled: store.get_bool(KEY_CSV_ENABLED, true),
            csv_path: PathBuf::from(store.get_string(KEY_CSV_PATH, default_csv_path())),
            symbols_path: PathBuf::from(store.get_string(KEY_SYMBOLS_PATH, default_symbols_path())),
        }
    }
}

fn invalid(key: &str, expected: &str) -> ConfigError {
    ConfigError::Message(format!("{} is not a valid {}", key, expected))
}

fn positive_or_default(key: &str, value: i64, default: i64) -> i64 {
    if value > 0 {
        value
    } else {
        warn!(key, value, default, "Config value must be positive, using default");
        default
    }
}
