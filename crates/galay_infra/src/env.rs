use std::path::{Path, PathBuf};
use std::str::FromStr;

use galay_domain::ChatConfig;
use tracing::{debug, warn};
use url::Url;

const BASE_URL: &str = "GALAY_AI_BASE_URL";
const CONNECT_TIMEOUT: &str = "GALAY_CONNECT_TIMEOUT_MS";
const IDLE_TIMEOUT: &str = "GALAY_IDLE_TIMEOUT_MS";
const FALLBACK_TIMEOUT: &str = "GALAY_FALLBACK_TIMEOUT_MS";
const USE_MEMORY: &str = "GALAY_USE_MEMORY";

/// Builds the chat configuration from `.env` files above `cwd` and the
/// process environment. Unset or unparsable variables keep their defaults.
pub fn resolve_chat_config(cwd: &Path) -> ChatConfig {
    dot_env(cwd);
    let mut config = ChatConfig::default();

    if let Some(raw) = parse_env::<String>(BASE_URL) {
        match Url::parse(raw.trim()) {
            Ok(url) => config.base_url = url,
            Err(error) => warn!(%error, value = %raw, "Ignoring invalid GALAY_AI_BASE_URL"),
        }
    }
    if let Some(parsed) = parse_env::<u64>(CONNECT_TIMEOUT) {
        config.connect_timeout_ms = parsed;
    }
    if let Some(parsed) = parse_env::<u64>(IDLE_TIMEOUT) {
        config.idle_timeout_ms = parsed;
    }
    if let Some(parsed) = parse_env::<u64>(FALLBACK_TIMEOUT) {
        config.fallback_timeout_ms = parsed;
    }
    if let Some(parsed) = parse_env::<bool>(USE_MEMORY) {
        config.use_memory = parsed;
    }

    debug!(config = ?config, "Resolved chat config");
    config
}

/// Load all `.env` files with priority to lower (closer) files.
fn dot_env(cwd: &Path) {
    let mut paths = vec![];
    let mut current = PathBuf::new();

    for component in cwd.components() {
        current.push(component);
        paths.push(current.clone());
    }

    paths.reverse();

    for path in paths {
        let env_file = path.join(".env");
        if env_file.is_file() {
            dotenvy::from_path(&env_file).ok();
        }
    }
}

/// Parses an environment value, returning `None` when it does not fit the
/// target type.
trait FromEnvStr: Sized {
    fn from_env_str(s: &str) -> Option<Self>;
}

/// "true", "1", "yes" (case-insensitive) are true; "false", "0", "no" are
/// false; anything else is ignored.
impl FromEnvStr for bool {
    fn from_env_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        }
    }
}

macro_rules! impl_from_env_str_via_from_str {
    ($($t:ty),* $(,)?) => {
        $(
            impl FromEnvStr for $t {
                fn from_env_str(s: &str) -> Option<Self> {
                    <$t as FromStr>::from_str(s.trim()).ok()
                }
            }
        )*
    };
}

impl_from_env_str_via_from_str! {
    u64, usize,
    String,
}

fn parse_env<T: FromEnvStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|val| T::from_env_str(&val))
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use tempfile::{TempDir, tempdir};

    use super::*;

    fn setup_envs(structure: Vec<(&str, &str)>) -> (TempDir, PathBuf) {
        let root = tempdir().unwrap();
        let root_path = root.path().to_path_buf();

        for (rel_path, content) in &structure {
            let dir = root_path.join(rel_path);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(".env"), content).unwrap();
        }

        let deepest_path = root_path.join(structure[0].0);
        // The temp dir lives as long as the returned guard.
        (root, deepest_path)
    }

    fn clean_env_vars() {
        for var in [BASE_URL, CONNECT_TIMEOUT, IDLE_TIMEOUT, FALLBACK_TIMEOUT, USE_MEMORY] {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clean_env_vars();
        let fixture = tempdir().unwrap();
        let actual = resolve_chat_config(fixture.path());
        let expected = ChatConfig::default();
        assert_eq!(actual, expected);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clean_env_vars();
        unsafe {
            env::set_var(BASE_URL, "https://chat.example.com/ai/");
            env::set_var(CONNECT_TIMEOUT, "2000");
            env::set_var(IDLE_TIMEOUT, " 9000 ");
            env::set_var(FALLBACK_TIMEOUT, "750");
            env::set_var(USE_MEMORY, "No");
        }
        let fixture = tempdir().unwrap();
        let actual = resolve_chat_config(fixture.path());
        clean_env_vars();

        assert_eq!(actual.base_url.as_str(), "https://chat.example.com/ai/");
        assert_eq!(actual.connect_timeout_ms, 2000);
        assert_eq!(actual.idle_timeout_ms, 9000);
        assert_eq!(actual.fallback_timeout_ms, 750);
        assert!(!actual.use_memory);
    }

    #[test]
    #[serial]
    fn test_invalid_values_keep_defaults() {
        clean_env_vars();
        unsafe {
            env::set_var(BASE_URL, "not a url");
            env::set_var(CONNECT_TIMEOUT, "soon");
            env::set_var(USE_MEMORY, "maybe");
        }
        let fixture = tempdir().unwrap();
        let actual = resolve_chat_config(fixture.path());
        clean_env_vars();

        assert_eq!(actual, ChatConfig::default());
    }

    #[test]
    #[serial]
    fn test_dot_env_closer_file_wins() {
        clean_env_vars();
        let (_root, cwd) = setup_envs(vec![
            ("app/web", "GALAY_IDLE_TIMEOUT_MS=1000"),
            ("app", "GALAY_IDLE_TIMEOUT_MS=2000\nGALAY_FALLBACK_TIMEOUT_MS=3000"),
        ]);
        let actual = resolve_chat_config(&cwd);
        clean_env_vars();

        assert_eq!(actual.idle_timeout_ms, 1000);
        assert_eq!(actual.fallback_timeout_ms, 3000);
    }

    #[test]
    #[serial]
    fn test_process_env_wins_over_dot_env() {
        clean_env_vars();
        let (_root, cwd) = setup_envs(vec![("a", "GALAY_CONNECT_TIMEOUT_MS=1")]);
        unsafe {
            env::set_var(CONNECT_TIMEOUT, "4000");
        }
        let actual = resolve_chat_config(&cwd);
        clean_env_vars();

        assert_eq!(actual.connect_timeout_ms, 4000);
    }

    #[test]
    fn test_bool_parsing() {
        assert_eq!(bool::from_env_str("YES"), Some(true));
        assert_eq!(bool::from_env_str("1"), Some(true));
        assert_eq!(bool::from_env_str("false"), Some(false));
        assert_eq!(bool::from_env_str("sometimes"), None);
    }
}
