//! CLI runner - executes commands

use crate::auth::FileCredentialStore;
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ClientConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClient, RequestDescriptor};
use crate::types::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Login { email, password } => {
                let password = match password {
                    Some(password) => password.clone(),
                    None => read_password().await?,
                };
                self.login(email, &password).await
            }
            Commands::Request {
                method,
                path,
                body,
                query,
            } => self.request(method, path, body.as_deref(), query).await,
            Commands::Logout => self.logout().await,
            Commands::Config => self.show_config(),
        }
    }

    /// Load client configuration
    fn load_config(&self) -> Result<ClientConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use -c flag)"))?;
        ClientConfig::from_file(path)
    }

    /// Build a client persisting its credential to the token file
    fn build_client(&self) -> Result<HttpClient> {
        let config = self.load_config()?;
        let store = FileCredentialStore::open(&self.cli.token_file)?;

        HttpClient::builder(config)
            .credential_store(Arc::new(store))
            .notifier(|| warn!("Session expired, run `campus-client login` again"))
            .build()
    }

    async fn login(&self, email: &str, password: &str) -> Result<()> {
        let client = self.build_client()?;
        let body = client
            .login(json!({ "email": email, "password": password }))
            .await?;
        self.emit(&body)
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<&str>,
        query: &[String],
    ) -> Result<()> {
        let method: Method = method.parse()?;
        let mut request = RequestDescriptor::new(method, path);

        if let Some(body) = body {
            request = request.json(serde_json::from_str(body).context("Invalid --body JSON")?);
        }

        for pair in query {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| Error::config(format!("Query must be key=value, got '{pair}'")))?;
            request = request.query(key, value);
        }

        let client = self.build_client()?;
        let response = client.request(request).await?;

        let value = if response.text().trim().is_empty() {
            json!({ "status": response.status() })
        } else {
            response
                .json::<Value>()
                .unwrap_or_else(|_| Value::String(response.text().to_string()))
        };
        self.emit(&value)
    }

    async fn logout(&self) -> Result<()> {
        self.build_client()?.logout().await
    }

    fn show_config(&self) -> Result<()> {
        let config = self.load_config()?;
        let value = serde_json::to_value(&config)?;
        self.emit(&value)
    }

    fn emit(&self, value: &Value) -> Result<()> {
        let out = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        println!("{out}");
        Ok(())
    }
}

/// Read the password from the first line of stdin
async fn read_password() -> Result<String> {
    eprint!("Password: ");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;

    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(Error::config("No password given (use --password, CAMPUS_PASSWORD or stdin)"));
    }
    Ok(password)
}
