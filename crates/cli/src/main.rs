// wikisync CLI - sync local Markdown documents into a wiki knowledge base

mod exit_codes;
mod sync;
mod wiki;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "wikisync")]
#[command(about = "Sync local Markdown documents into a wiki knowledge base")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify application credentials and save them for later runs
    #[command(after_help = "\
Examples:
  wikisync login --app-id cli_xxx --app-secret yyy
  WIKISYNC_APP_ID=cli_xxx WIKISYNC_APP_SECRET=yyy wikisync login")]
    Login {
        /// Application identifier issued by the wiki platform
        #[arg(long, env = "WIKISYNC_APP_ID")]
        app_id: Option<String>,

        /// Application secret issued by the wiki platform
        #[arg(long, env = "WIKISYNC_APP_SECRET")]
        app_secret: Option<String>,

        /// API base URL (defaults to the configured one)
        #[arg(long)]
        api_base: Option<String>,
    },

    /// Upload every Markdown file under a directory as wiki documents
    #[command(after_help = "\
Examples:
  wikisync sync ./docs --space 7034 --parent wikcnKQ...
  wikisync sync            # uses configured docs dir / space / parent")]
    Sync {
        /// Directory to scan (defaults to the configured docs dir)
        dir: Option<PathBuf>,

        /// Target space (knowledge base) identifier
        #[arg(long)]
        space: Option<String>,

        /// Parent node token to create documents under
        #[arg(long)]
        parent: Option<String>,

        /// Suppress per-file progress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Delete saved application credentials
    Logout,

    /// List the nodes of a wiki space with their tokens
    Nodes {
        /// Space identifier (defaults to the configured one)
        #[arg(long)]
        space: Option<String>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Login { app_id, app_secret, api_base } => {
            wiki::cmd_login(app_id, app_secret, api_base)
        }
        Commands::Sync { dir, space, parent, quiet } => {
            sync::cmd_sync(dir, space, parent, quiet)
        }
        Commands::Logout => wiki::cmd_logout(),
        Commands::Nodes { space } => wiki::cmd_nodes(space),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
