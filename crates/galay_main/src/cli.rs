use clap::{Args, Parser, Subcommand};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "galay-chat", version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Message to send without entering interactive mode.
    ///
    /// Content can also be piped: `cat question.txt | galay-chat`.
    #[arg(long, short = 'p', allow_hyphen_values = true)]
    pub prompt: Option<String>,

    /// Piped input from stdin (populated internally)
    #[arg(skip)]
    pub piped_input: Option<String>,

    /// Base url of the chat service, e.g. `http://localhost:8080/ai/`.
    ///
    /// Overrides `GALAY_AI_BASE_URL`.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<Url>,

    /// Session id to send instead of the stored one.
    #[arg(long, value_name = "ID")]
    pub session: Option<String>,

    /// Ask the service not to use conversation memory.
    #[arg(long, default_value_t = false)]
    pub no_memory: bool,

    /// Answer from built-in sample cases instead of the network.
    #[arg(long, default_value_t = false)]
    pub mock: bool,

    /// Enable verbose logging output.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    /// Print the final HTML instead of terminal text.
    #[arg(long, default_value_t = false)]
    pub html: bool,

    /// Forget the stored session and start a new one.
    #[arg(long, default_value_t = false)]
    pub reset_session: bool,

    #[command(subcommand)]
    pub subcommands: Option<TopLevelCommand>,
}

impl Cli {
    /// The single message to send, if one was given.
    pub fn message(&self) -> Option<&str> {
        self.prompt.as_deref().or(self.piped_input.as_deref())
    }

    pub fn is_interactive(&self) -> bool {
        self.message().is_none() && self.subcommands.is_none()
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum TopLevelCommand {
    /// POST to a stream endpoint and print every line with elapsed time.
    Probe(ProbeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProbeArgs {
    /// Target stream url.
    #[arg(long)]
    pub url: Url,

    /// JSON request body.
    #[arg(
        long,
        default_value = r#"{"message":"ping","session_id":"demo","use_memory":true}"#
    )]
    pub body: String,

    /// Seconds before the probe gives up.
    #[arg(long, default_value_t = 8.0)]
    pub timeout: f64,
}
