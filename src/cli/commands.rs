//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Campus LMS API client
#[derive(Parser, Debug)]
#[command(name = "campus-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// File holding the session credential between runs
    #[arg(short, long, global = true, default_value = ".campus-session.json")]
    pub token_file: PathBuf,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session credential
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password; read from stdin when neither the flag nor
        /// CAMPUS_PASSWORD is set
        #[arg(long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Send an authenticated request
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,

        /// Path relative to the base URL
        path: String,

        /// Inline JSON body
        #[arg(long)]
        body: Option<String>,

        /// Query parameter (key=value, repeatable)
        #[arg(short, long = "query")]
        query: Vec<String>,
    },

    /// Sign out and forget the session credential
    Logout,

    /// Show the effective configuration
    Config,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON (one document per line)
    Json,
    /// Indented JSON
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let cli = Cli::try_parse_from([
            "campus-client",
            "-c",
            "client.yaml",
            "request",
            "GET",
            "/assignments",
            "-q",
            "page=2",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("client.yaml")));
        assert_eq!(cli.token_file, PathBuf::from(".campus-session.json"));
        match cli.command {
            Commands::Request {
                method,
                path,
                body,
                query,
            } => {
                assert_eq!(method, "GET");
                assert_eq!(path, "/assignments");
                assert!(body.is_none());
                assert_eq!(query, vec!["page=2".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_login_requires_email() {
        assert!(Cli::try_parse_from(["campus-client", "login"]).is_err());
    }

    #[test]
    fn test_parse_login_password_is_optional() {
        let cli = Cli::try_parse_from(["campus-client", "login", "--email", "a@b.c"]).unwrap();
        match cli.command {
            Commands::Login { email, .. } => assert_eq!(email, "a@b.c"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
