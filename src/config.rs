use crate::Cli;
use crate::llm::groq;
use crate::llm::prompt_builder::Sampling;
use crate::llm::stream::record::Leniency;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/chat";
pub const DEFAULT_MODEL: &str = "phi";
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Final resolved configuration for owlet.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub api_key: Option<String>,
    pub custom_api_url: Option<String>,
    pub groq_api_key: Option<String>,
    pub groq_api_url: String,
    pub model: String,
    pub no_model: bool,
    pub sampling: Sampling,
    pub stream: bool,
    pub leniency: Leniency,
    pub timeout: Option<Duration>,
}

impl Config {
    /// Build the final config from CLI flags, environment, TOML file, and defaults.
    ///
    /// Precedence:
    ///   1. CLI flags (`--model`, `--api-url`, ...)
    ///   2. Env vars (`OWLET_MODEL`, `OWLET_API_URL`, `GROQ_API_KEY`, ...)
    ///   3. TOML `~/.config/owlet.toml`
    ///   4. Hardcoded defaults (local endpoint, model "phi")
    pub fn from_sources(cli: &Cli) -> Self {
        let file_cfg = load_file_config().unwrap_or_default();
        Self::resolve(cli, file_cfg, |key| env::var(key).ok())
    }

    fn resolve(cli: &Cli, file_cfg: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let model = cli
            .model
            .clone()
            .or_else(|| env("OWLET_MODEL"))
            .or(file_cfg.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_url = cli
            .api_url
            .clone()
            .or_else(|| env("OWLET_API_URL"))
            .or(file_cfg.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let custom_api_url = cli
            .custom_api_url
            .clone()
            .or_else(|| env("OWLET_CUSTOM_API_URL"))
            .or(file_cfg.custom_api_url)
            .filter(|url| !url.trim().is_empty());

        let groq_api_url = env("OWLET_GROQ_API_URL")
            .or(file_cfg.groq_api_url)
            .unwrap_or_else(|| groq::DEFAULT_BASE_URL.to_string());

        let leniency = if cli.strict_stream || file_cfg.strict_stream.unwrap_or(false) {
            Leniency::Strict
        } else {
            Leniency::Lenient
        };

        Config {
            no_model: cli.no_model || model.eq_ignore_ascii_case("none"),
            model,
            api_url,
            // clap already folds OWLET_API_KEY / GROQ_API_KEY into these
            api_key: cli.api_key.clone().or(file_cfg.api_key),
            custom_api_url,
            groq_api_key: cli.groq_api_key.clone().or(file_cfg.groq_api_key),
            groq_api_url,
            sampling: Sampling {
                max_tokens: cli
                    .max_tokens
                    .or(file_cfg.max_tokens)
                    .unwrap_or(DEFAULT_MAX_TOKENS),
                temperature: cli
                    .temperature
                    .or(file_cfg.temperature)
                    .unwrap_or(DEFAULT_TEMPERATURE),
            },
            stream: !cli.no_stream && file_cfg.stream.unwrap_or(true),
            leniency,
            timeout: cli
                .timeout
                .or(file_cfg.timeout_secs)
                .map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    /// Default model to use when not provided via CLI or env.
    pub model: Option<String>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub custom_api_url: Option<String>,
    pub groq_api_key: Option<String>,
    pub groq_api_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub stream: Option<bool>,
    pub strict_stream: Option<bool>,
    pub timeout_secs: Option<u64>,
}

/// Return `~/.config/owlet.toml`
fn config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("owlet.toml"))
}

fn load_file_config() -> Option<FileConfig> {
    let path = config_path()?;
    if !path.exists() {
        return None;
    }

    let data = fs::read_to_string(&path).ok()?;
    match toml::from_str::<FileConfig>(&data) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            log::warn!("Ignoring {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["owlet"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = Config::resolve(&cli(&[]), FileConfig::default(), no_env);
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.groq_api_url, groq::DEFAULT_BASE_URL);
        assert_eq!(cfg.sampling.max_tokens, 2048);
        assert_eq!(cfg.sampling.temperature, 0.7);
        assert!(cfg.stream);
        assert!(!cfg.no_model);
        assert_eq!(cfg.leniency, Leniency::Lenient);
        assert_eq!(cfg.timeout, None);
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let file: FileConfig = toml::from_str(
            r#"
            model = "from-file"
            api_url = "http://file/api"
            max_tokens = 100
            temperature = 0.1
            stream = false
            "#,
        )
        .unwrap();
        let env_vars: HashMap<&str, &str> =
            HashMap::from([("OWLET_MODEL", "from-env"), ("OWLET_API_URL", "http://env/api")]);
        let env = |k: &str| env_vars.get(k).map(|v| v.to_string());

        let cfg = Config::resolve(&cli(&["--model", "from-cli"]), file, env);
        assert_eq!(cfg.model, "from-cli");
        assert_eq!(cfg.api_url, "http://env/api");
        assert_eq!(cfg.sampling.max_tokens, 100);
        assert!(!cfg.stream);
    }

    #[test]
    fn model_none_disables_calls() {
        let cfg = Config::resolve(&cli(&["--model", "None"]), FileConfig::default(), no_env);
        assert!(cfg.no_model);
    }

    #[test]
    fn stream_flags() {
        let cfg = Config::resolve(
            &cli(&["--no-stream", "--strict-stream", "--timeout", "30"]),
            FileConfig::default(),
            no_env,
        );
        assert!(!cfg.stream);
        assert_eq!(cfg.leniency, Leniency::Strict);
        assert_eq!(cfg.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn blank_custom_url_is_ignored() {
        let file = FileConfig {
            custom_api_url: Some("  ".into()),
            ..FileConfig::default()
        };
        let cfg = Config::resolve(&cli(&[]), file, no_env);
        assert_eq!(cfg.custom_api_url, None);
    }
}
