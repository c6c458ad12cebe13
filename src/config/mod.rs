use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use serde::Serialize;

pub const DEFAULT_ENGINE_BASE_URL: &str = "https://emkc.org/api/v2/piston";

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    read_env: bool,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(&default_config_path())
    }

    pub fn load_from(config_path: &Path) -> Self {
        let mut map = default_map();

        // Read .coderunrc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, read_env: true, config_path: config_path.to_path_buf() }
    }

    /// Defaults overlaid with `entries`, without consulting the rc file or the environment.
    pub fn from_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = default_map();
        for (k, v) in entries {
            map.insert(k.into(), v.into());
        }
        Self { inner: map, read_env: false, config_path: PathBuf::new() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if self.read_env {
            if let Ok(v) = env::var(key) {
                return Some(v);
            }
        }
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.trim().parse::<i64>().ok())
    }

    pub fn engine_base_url(&self) -> String {
        self.get("ENGINE_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENGINE_BASE_URL.to_string())
    }

    pub fn default_language(&self) -> String {
        self.get("DEFAULT_LANGUAGE").unwrap_or_else(|| "python".into())
    }

    pub fn budgets(&self) -> Budgets {
        Budgets::from_config(self)
    }
}

/// Resource ceilings sent with every submission. Enforced by the engine, never by us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Budgets {
    pub compile_timeout_ms: u64,
    pub run_timeout_ms: u64,
    /// `-1` is unlimited.
    pub compile_memory_limit: i64,
    /// `-1` is unlimited.
    pub run_memory_limit: i64,
}

impl Default for Budgets {
    fn default() -> Self {
        Self {
            compile_timeout_ms: 10_000,
            run_timeout_ms: 5_000,
            compile_memory_limit: -1,
            run_memory_limit: -1,
        }
    }
}

impl Budgets {
    pub fn from_config(cfg: &Config) -> Self {
        let d = Self::default();
        Self {
            compile_timeout_ms: cfg.get_u64("COMPILE_TIMEOUT_MS").unwrap_or(d.compile_timeout_ms),
            run_timeout_ms: cfg.get_u64("RUN_TIMEOUT_MS").unwrap_or(d.run_timeout_ms),
            compile_memory_limit: cfg.get_i64("COMPILE_MEMORY_LIMIT").unwrap_or(d.compile_memory_limit),
            run_memory_limit: cfg.get_i64("RUN_MEMORY_LIMIT").unwrap_or(d.run_memory_limit),
        }
    }

    /// Worst case time the engine may spend on one submission.
    pub fn worst_case_ms(&self) -> u64 {
        self.compile_timeout_ms.saturating_add(self.run_timeout_ms)
    }
}

fn is_config_key(k: &str) -> bool {
    // Accept known keys or CODERUN_* for forward-compat
    const KEYS: &[&str] = &[
        "ENGINE_BASE_URL",
        "ENGINE_API_KEY",
        "REQUEST_TIMEOUT",
        "COMPILE_TIMEOUT_MS",
        "RUN_TIMEOUT_MS",
        "COMPILE_MEMORY_LIMIT",
        "RUN_MEMORY_LIMIT",
        "DEFAULT_LANGUAGE",
        "PRETTIFY_OUTPUT",
    ];

    KEYS.contains(&k) || k.starts_with("CODERUN_")
}

pub fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("coderun").join(".coderunrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    let budgets = Budgets::default();

    // Engine
    m.insert("ENGINE_BASE_URL".into(), DEFAULT_ENGINE_BASE_URL.into());
    m.insert("REQUEST_TIMEOUT".into(), "30".into());

    // Budgets
    m.insert("COMPILE_TIMEOUT_MS".into(), budgets.compile_timeout_ms.to_string());
    m.insert("RUN_TIMEOUT_MS".into(), budgets.run_timeout_ms.to_string());
    m.insert("COMPILE_MEMORY_LIMIT".into(), budgets.compile_memory_limit.to_string());
    m.insert("RUN_MEMORY_LIMIT".into(), budgets.run_memory_limit.to_string());

    // Strings
    m.insert("DEFAULT_LANGUAGE".into(), "python".into());

    // Bools as strings
    m.insert("PRETTIFY_OUTPUT".into(), "true".into());

    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_observed_budgets() {
        let cfg = Config::from_map(Vec::<(String, String)>::new());
        assert_eq!(cfg.budgets(), Budgets::default());
        assert_eq!(cfg.budgets().worst_case_ms(), 15_000);
        assert_eq!(cfg.engine_base_url(), DEFAULT_ENGINE_BASE_URL);
        assert!(cfg.get_bool("PRETTIFY_OUTPUT"));
    }

    #[test]
    fn unparsable_budget_falls_back_to_default() {
        let cfg = Config::from_map([("RUN_TIMEOUT_MS", "soon"), ("COMPILE_MEMORY_LIMIT", "268435456")]);
        let b = cfg.budgets();
        assert_eq!(b.run_timeout_ms, 5_000);
        assert_eq!(b.compile_memory_limit, 268_435_456);
    }

    #[test]
    fn rc_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".coderunrc");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "# local engine").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "CODERUN_TEST_ONLY_KEY = http://localhost:2000/api/v2").unwrap();
        writeln!(f, "CODERUN_TEST_ONLY_FLAG=TRUE").unwrap();
        drop(f);

        let cfg = Config::load_from(&path);
        assert_eq!(cfg.get("CODERUN_TEST_ONLY_KEY").as_deref(), Some("http://localhost:2000/api/v2"));
        assert!(cfg.get_bool("CODERUN_TEST_ONLY_FLAG"));
        assert_eq!(cfg.config_path, path);
    }

    #[test]
    fn only_known_or_prefixed_keys_come_from_env() {
        assert!(is_config_key("RUN_TIMEOUT_MS"));
        assert!(is_config_key("CODERUN_LOG"));
        assert!(!is_config_key("HOME"));
    }
}
