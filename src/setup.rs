use anyhow::Result;
use log::debug;

use crate::config::Config;
use crate::llm::groq::{GroqClient, GROQ_MODEL};
use crate::llm::local::LocalClient;
use crate::llm::noop::NoopClient;
use crate::llm::{ApiError, LlmClient};

/// Model id that selects the user-supplied custom endpoint.
pub const CUSTOM_MODEL: &str = "custom-model";

/// Which upstream a model id is routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Noop,
    Groq,
    Custom(String),
    Local(String),
}

pub fn select_backend(cfg: &Config) -> Backend {
    if cfg.no_model {
        return Backend::Noop;
    }

    if cfg.model == GROQ_MODEL {
        return Backend::Groq;
    }

    match (&cfg.custom_api_url, cfg.model.as_str()) {
        (Some(url), CUSTOM_MODEL) => Backend::Custom(url.clone()),
        _ => Backend::Local(cfg.api_url.clone()),
    }
}

/// Build the LLM client based on CLI + config.
pub fn build_llm_client(cfg: &Config) -> Result<Box<dyn LlmClient>> {
    let backend = select_backend(cfg);
    debug!("Model {:?} routed to {:?}", cfg.model, backend);

    let client: Box<dyn LlmClient> = match backend {
        Backend::Noop => Box::new(NoopClient),
        Backend::Groq => {
            let key = cfg.groq_api_key.clone().ok_or_else(|| {
                ApiError::Config(format!(
                    "GROQ_API_KEY (or --groq-api-key) is required for model {GROQ_MODEL}"
                ))
            })?;
            Box::new(
                GroqClient::new(key, cfg.groq_api_url.clone(), cfg.timeout)?
                    .with_leniency(cfg.leniency),
            )
        }
        Backend::Custom(url) => {
            Box::new(LocalClient::custom(url, cfg.timeout)?.with_leniency(cfg.leniency))
        }
        Backend::Local(url) => Box::new(
            LocalClient::new(url, cfg.api_key.clone(), cfg.timeout)?.with_leniency(cfg.leniency),
        ),
    };

    Ok(client)
}
