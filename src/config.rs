use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::ClientConfig;
use crate::protocol::ProtocolGeneration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Default, PartialEq)]
struct RcConfig {
    url: Option<String>,
    version: Option<String>,
    timeout: Option<String>,
    verify: Option<bool>,
}

/// Resolves a [`ClientConfig`] from, in order of precedence: the explicit arguments, the
/// `LATIS_*` environment variables, the first existing rc file, and the defaults.
pub(crate) fn load_config(
    url: Option<String>,
    generation: Option<ProtocolGeneration>,
) -> Result<ClientConfig> {
    load_config_with(url, generation, |key| std::env::var(key).ok(), &rc_candidates())
}

/// [`load_config`] with the environment lookup and the rc candidates supplied by the caller.
pub(crate) fn load_config_with(
    url: Option<String>,
    generation: Option<ProtocolGeneration>,
    env: impl Fn(&str) -> Option<String>,
    rc_candidates: &[PathBuf],
) -> Result<ClientConfig> {
    let mut url = url.or_else(|| env("LATIS_URL"));
    let mut version = env("LATIS_VERSION");
    let mut timeout = env("LATIS_TIMEOUT");
    let mut verify: Option<bool> = None;

    for rc_path in rc_candidates {
        if rc_path.exists() {
            let cfg = read_rc(rc_path).with_context(|| {
                format!("failed to read configuration file {}", rc_path.display())
            })?;

            url = url.or(cfg.url);
            version = version.or(cfg.version);
            timeout = timeout.or(cfg.timeout);
            verify = cfg.verify;
            break;
        }
    }

    let url = match url {
        Some(v) => v,
        None => {
            if !rc_candidates.is_empty() {
                bail!(
                    "Missing configuration: url (set LATIS_URL or put `url:` in one of: {})",
                    rc_candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            bail!("Missing configuration: url (set LATIS_URL or create .latisrc)");
        }
    };

    let generation = match generation {
        Some(g) => Some(g),
        None => version
            .as_deref()
            .map(str::parse::<ProtocolGeneration>)
            .transpose()?,
    };

    let timeout = match timeout {
        Some(t) => Duration::from_secs(
            t.trim()
                .parse()
                .with_context(|| format!("invalid timeout [{t}]; expected whole seconds"))?,
        ),
        None => DEFAULT_TIMEOUT,
    };

    Ok(ClientConfig {
        url,
        generation,
        timeout,
        verify: verify.unwrap_or(true),
        progress: false,
    })
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    // `key:` may be followed by its value on the next line.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            if !line.contains(':') || (pk == "url" && line.contains("://")) {
                cfg.set(pk, strip_quotes(line));
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                pending_key = Some(k);
            } else {
                cfg.set(k, v);
            }
        }
    }

    cfg
}

impl RcConfig {
    fn set(&mut self, key: &str, value: &str) {
        match key {
            "url" => self.url = Some(value.to_string()),
            "version" => self.version = Some(value.to_string()),
            "timeout" => self.timeout = Some(value.to_string()),
            "verify" => self.verify = Some(value != "0"),
            _ => {}
        }
    }
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // 1) LATIS_RC (explicit)
    // 2) ./.latisrc
    // 3) ~/.latisrc
    if let Ok(p) = std::env::var("LATIS_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".latisrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".latisrc"));
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn rc_file(dir: &tempfile::TempDir, text: &str) -> Vec<PathBuf> {
        let path = dir.path().join(".latisrc");
        std::fs::write(&path, text).unwrap();
        vec![path]
    }

    const RC: &str = "url: http://rc/latis\nversion: 2\ntimeout: 30\nverify: 0\n";

    #[test]
    fn parses_rc_keys() {
        let cfg = parse_rc(concat!(
            "# lisird\n",
            "url: https://lasp.colorado.edu/lisird/latis\n",
            "version: '2'\n",
            "timeout: 30\n",
            "verify: 0\n",
            "unknown: x\n",
        ));
        assert_eq!(
            cfg,
            RcConfig {
                url: Some("https://lasp.colorado.edu/lisird/latis".into()),
                version: Some("2".into()),
                timeout: Some("30".into()),
                verify: Some(false),
            }
        );
    }

    #[test]
    fn value_may_continue_on_next_line() {
        let cfg = parse_rc("url:\n  \"https://example.org/latis\"\nversion:\n3\n");
        assert_eq!(cfg.url.as_deref(), Some("https://example.org/latis"));
        assert_eq!(cfg.version.as_deref(), Some("3"));
    }

    #[test]
    fn dangling_key_does_not_swallow_next_key() {
        let cfg = parse_rc("version:\nurl: http://h/latis\n");
        assert_eq!(cfg.version, None);
        assert_eq!(cfg.url.as_deref(), Some("http://h/latis"));
    }

    #[test]
    fn reads_rc_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".latisrc");
        std::fs::write(&path, "url: http://h/latis\n").unwrap();
        assert_eq!(read_rc(&path).unwrap().url.as_deref(), Some("http://h/latis"));
    }

    #[test]
    fn explicit_arguments_win_over_env_and_rc() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_of(&[("LATIS_URL", "http://env/latis"), ("LATIS_VERSION", "3")]);
        let cfg = load_config_with(
            Some("http://arg/latis".into()),
            Some(ProtocolGeneration::Legacy),
            env,
            &rc_file(&dir, RC),
        )
        .unwrap();
        assert_eq!(cfg.url, "http://arg/latis");
        assert_eq!(cfg.generation, Some(ProtocolGeneration::Legacy));
    }

    #[test]
    fn env_wins_over_rc() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_of(&[
            ("LATIS_URL", "http://env/latis"),
            ("LATIS_VERSION", "v3"),
            ("LATIS_TIMEOUT", "5"),
        ]);
        let cfg = load_config_with(None, None, env, &rc_file(&dir, RC)).unwrap();
        assert_eq!(cfg.url, "http://env/latis");
        assert_eq!(cfg.generation, Some(ProtocolGeneration::Current));
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        // verify has no env variable, so the rc value still applies
        assert!(!cfg.verify);
    }

    #[test]
    fn rc_fills_what_env_leaves_unset() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_with(None, None, env_of(&[]), &rc_file(&dir, RC)).unwrap();
        assert_eq!(cfg.url, "http://rc/latis");
        assert_eq!(cfg.generation, Some(ProtocolGeneration::Legacy));
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert!(!cfg.verify);
    }

    #[test]
    fn first_existing_rc_is_the_only_one_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut candidates = vec![dir.path().join("absent")];
        candidates.extend(rc_file(&dir, "url: http://first/latis\n"));
        let later = dir.path().join("later");
        std::fs::write(&later, "url: http://later/latis\ntimeout: 9\n").unwrap();
        candidates.push(later);

        let cfg = load_config_with(None, None, env_of(&[]), &candidates).unwrap();
        assert_eq!(cfg.url, "http://first/latis");
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn defaults_apply_when_only_url_is_known() {
        let env = env_of(&[("LATIS_URL", "http://env/latis")]);
        let cfg = load_config_with(None, None, env, &[]).unwrap();
        assert_eq!(cfg.generation, None);
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
        assert!(cfg.verify);
        assert!(!cfg.progress);
    }

    #[test]
    fn invalid_timeout_is_an_error() {
        let env = env_of(&[("LATIS_URL", "http://env/latis"), ("LATIS_TIMEOUT", "1.5")]);
        let err = load_config_with(None, None, env, &[]).unwrap_err();
        assert!(err.to_string().contains("invalid timeout [1.5]"));
    }

    #[test]
    fn invalid_version_is_an_error() {
        let env = env_of(&[("LATIS_URL", "http://env/latis"), ("LATIS_VERSION", "4")]);
        assert!(load_config_with(None, None, env, &[]).is_err());
    }

    #[test]
    fn missing_url_lists_rc_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("nowhere.latisrc");
        let err = load_config_with(None, None, env_of(&[]), std::slice::from_ref(&absent))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Missing configuration: url"));
        assert!(msg.contains(&absent.display().to_string()));

        let err = load_config_with(None, None, env_of(&[]), &[]).unwrap_err();
        assert!(err.to_string().contains("create .latisrc"));
    }
}
