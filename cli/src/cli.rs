//! Command-line surface.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_SESSION_FILE: &str = ".catalog-session.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Film and actor catalog administration.
#[derive(Parser, Debug)]
#[command(name = "catalog", version, about = "Film and actor catalog admin client")]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    /// Print records as JSON instead of a table.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection and storage settings. Flags override the environment.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the catalog API.
    #[arg(
        long,
        global = true,
        env = "CATALOG_API_BASE_URL",
        default_value = DEFAULT_BASE_URL
    )]
    pub base_url: String,

    /// File holding the session between invocations.
    #[arg(
        long,
        global = true,
        env = "CATALOG_SESSION_FILE",
        default_value = DEFAULT_SESSION_FILE
    )]
    pub session_file: PathBuf,

    /// Per-request timeout in seconds.
    #[arg(
        long = "timeout",
        global = true,
        env = "CATALOG_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub timeout_secs: u64,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Sign in and store the session.
    Login {
        #[arg(long, short)]
        username: String,
        /// Read from stdin when omitted.
        #[arg(long, short, env = "CATALOG_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Manage films.
    Films {
        #[command(subcommand)]
        action: FilmCommand,
    },
    /// Manage actors.
    Actors {
        #[command(subcommand)]
        action: ActorCommand,
    },
    /// Send a password reset code.
    ForgotPassword {
        #[arg(long, short)]
        username: String,
    },
    /// Set a new password with a reset code.
    ResetPassword {
        #[arg(long, short)]
        username: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        new_password: String,
        /// Defaults to the new password.
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Confirm a new account with the emailed code.
    ConfirmSignup {
        #[arg(long, short)]
        username: String,
        #[arg(long)]
        code: String,
    },
    /// Send the sign-up confirmation code again.
    ResendCode {
        #[arg(long, short)]
        username: String,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum FilmCommand {
    List,
    Show {
        id: String,
    },
    Create {
        #[command(flatten)]
        fields: FilmFields,
    },
    /// Change the given fields; the rest keep their current values.
    Edit {
        id: String,
        #[command(flatten)]
        fields: FilmFields,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ActorCommand {
    List,
    Show {
        id: String,
    },
    Create {
        #[command(flatten)]
        fields: ActorFields,
    },
    /// Change the given fields; the rest keep their current values.
    Edit {
        id: String,
        #[command(flatten)]
        fields: ActorFields,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
}

/// Raw form input; validation happens in the form, not here.
#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct FilmFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub image_path: Option<String>,
    #[arg(long)]
    pub release_year: Option<String>,
    /// One of G, PG, PG-13, R, NC-17.
    #[arg(long)]
    pub rating: Option<String>,
}

#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct ActorFields {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
}
