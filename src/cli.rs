use std::path::PathBuf;

use clap::Parser;

use crate::cli::init::{InitCommand, InitCommandOptions};

pub mod init;

#[derive(Parser)]
#[command(about = "Multi-strategy HTTP response cache for a remote origin")]
struct Args {
    #[clap(subcommand)]
    pub command: Command,
    /// Path to the config file instead of the default location
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    /// Verbose mode
    #[clap(long, short, global = true)]
    verbose: bool,
}

#[derive(Parser)]
enum Command {
    #[clap(about = "Initialize the config file")]
    Init(InitCommand),
    #[clap(about = "Fetch a URL through the caching layer")]
    Get(GetCommand),
    #[clap(about = "Pre-cache the application shell for this generation")]
    Install(HostCommand),
    #[clap(about = "Activate this generation and evict stale partitions")]
    Activate(HostCommand),
    #[clap(about = "List cache partitions with their entry counts")]
    Status(HostCommand),
    #[clap(about = "Deliver a remote control message")]
    Message(MessageCommand),
}

#[derive(Parser)]
struct GetCommand {
    /// Absolute URL or origin relative path
    #[clap()]
    pub url: String,
    /// Config section to use. Derived from the URL host when absent
    #[clap(long)]
    pub domain: Option<String>,
}

#[derive(Parser)]
struct HostCommand {
    /// Config section to use
    #[clap(long)]
    pub domain: String,
}

#[derive(Parser)]
struct MessageCommand {
    /// JSON payload, e.g. '{"type": "SKIP_WAITING"}'
    #[clap()]
    pub payload: String,
    /// Config section to use
    #[clap(long)]
    pub domain: String,
}

pub struct GetCommandOptions {
    pub url: String,
    pub domain: Option<String>,
}

pub struct HostCommandOptions {
    pub domain: String,
}

pub struct MessageCommandOptions {
    pub payload: String,
    pub domain: String,
}

impl From<GetCommand> for GetCommandOptions {
    fn from(options: GetCommand) -> Self {
        GetCommandOptions {
            url: options.url,
            domain: options.domain,
        }
    }
}

impl From<HostCommand> for HostCommandOptions {
    fn from(options: HostCommand) -> Self {
        HostCommandOptions {
            domain: options.domain,
        }
    }
}

impl From<MessageCommand> for MessageCommandOptions {
    fn from(options: MessageCommand) -> Self {
        MessageCommandOptions {
            payload: options.payload,
            domain: options.domain,
        }
    }
}

pub enum CliOptions {
    Init(InitCommandOptions),
    Get(GetCommandOptions),
    Install(HostCommandOptions),
    Activate(HostCommandOptions),
    Status(HostCommandOptions),
    Message(MessageCommandOptions),
}

impl CliOptions {
    /// Config section the command operates on. `get` falls back to the host
    /// of an absolute URL.
    pub fn domain(&self) -> Option<String> {
        match self {
            CliOptions::Init(options) => Some(options.domain.clone()),
            CliOptions::Get(options) => options
                .domain
                .clone()
                .or_else(|| domain_from_url(&options.url)),
            CliOptions::Install(options)
            | CliOptions::Activate(options)
            | CliOptions::Status(options) => Some(options.domain.clone()),
            CliOptions::Message(options) => Some(options.domain.clone()),
        }
    }
}

pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

pub struct OptionArgs {
    pub cli_options: CliOptions,
    pub cli_args: CliArgs,
}

pub fn parse_cli() -> OptionArgs {
    let args = Args::parse();
    let cli_args = CliArgs {
        config: args.config,
        verbose: args.verbose,
    };
    let cli_options = match args.command {
        Command::Init(sub_matches) => CliOptions::Init(sub_matches.into()),
        Command::Get(sub_matches) => CliOptions::Get(sub_matches.into()),
        Command::Install(sub_matches) => CliOptions::Install(sub_matches.into()),
        Command::Activate(sub_matches) => CliOptions::Activate(sub_matches.into()),
        Command::Status(sub_matches) => CliOptions::Status(sub_matches.into()),
        Command::Message(sub_matches) => CliOptions::Message(sub_matches.into()),
    };
    OptionArgs {
        cli_options,
        cli_args,
    }
}

fn domain_from_url(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}
