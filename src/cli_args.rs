use clap::{ArgAction, ArgGroup, Parser, Subcommand};

/// CLI options
#[derive(Parser, Debug)]
#[command(
    name = "owlet",
    version,
    about = "Chat with the Owlet university-support assistant"
)]
#[command(group(
    ArgGroup::new("model_group")
        .args(["model", "no_model"])
        .multiple(false)
))]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Model to use: 'phi' (local), 'custom-model' (custom URL) or 'llama-3.3-70b-versatile' (Groq).
    /// If 'none', acts like --no-model.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Disable model calls; return dummy responses instead
    #[arg(long, global = true)]
    pub no_model: bool,

    /// Local inference endpoint (otherwise OWLET_API_URL or the config file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Key sent as X-API-Key to the local endpoint
    #[arg(long, env = "OWLET_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Endpoint used when the model is 'custom-model'
    #[arg(long, global = true)]
    pub custom_api_url: Option<String>,

    /// Groq API key (otherwise uses GROQ_API_KEY env var)
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true, global = true)]
    pub groq_api_key: Option<String>,

    /// Wait for the whole reply instead of streaming it
    #[arg(long, global = true)]
    pub no_stream: bool,

    /// Fail the reply on a malformed stream record instead of skipping it
    #[arg(long, global = true)]
    pub strict_stream: bool,

    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,

    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Overall deadline for one request, in seconds (default: none)
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Subcommand; defaults to an interactive chat
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a single message and print the reply
    Ask {
        /// The message; multiple words are joined with spaces
        #[arg(required = true)]
        message: Vec<String>,
    },

    /// Interactive conversation (type /reset to forget history, /quit to leave)
    Chat,
}
