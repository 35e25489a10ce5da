//! CommandListing - runs an external listing command
//!
//! The template is split on whitespace into argv; the standalone `{}` token
//! is replaced by the path. No shell is involved, so paths are passed verbatim.

use std::process::Stdio;

use contracts::{ContractError, ListingClient, TEMPLATE_PLACEHOLDER};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::parse_lines;

/// Listing through a command such as `hdfs dfs -ls -C {}`
#[derive(Debug, Clone)]
pub struct CommandListing {
    program: String,
    args: Vec<String>,
}

impl CommandListing {
    /// Build from a command template
    pub fn from_template(template: &str) -> Result<Self, ContractError> {
        let mut tokens = template.split_whitespace().map(str::to_string);
        let program = tokens
            .next()
            .ok_or_else(|| ContractError::config_parse("listing command template is empty"))?;
        let args: Vec<String> = tokens.collect();

        if !args.iter().any(|arg| arg == TEMPLATE_PLACEHOLDER) {
            return Err(ContractError::config_parse(format!(
                "listing command template has no standalone '{TEMPLATE_PLACEHOLDER}' argument: {template}"
            )));
        }

        Ok(Self { program, args })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with the placeholder replaced by `path`
    pub fn args_for(&self, path: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                if arg == TEMPLATE_PLACEHOLDER {
                    path.to_string()
                } else {
                    arg.clone()
                }
            })
            .collect()
    }
}

impl ListingClient for CommandListing {
    fn name(&self) -> &str {
        "command"
    }

    #[instrument(
        name = "command_listing_list",
        skip(self),
        fields(program = %self.program, path = %path)
    )]
    async fn list(&self, path: &str) -> Result<Vec<String>, ContractError> {
        let output = Command::new(&self.program)
            .args(self.args_for(path))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                ContractError::listing(path, format!("failed to run '{}': {e}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr.trim(), "Listing command failed");
            return Err(ContractError::listing(
                path,
                format!("'{}' exited with {}: {}", self.program, output.status, stderr.trim()),
            ));
        }

        let entries = parse_lines(&output.stdout);
        debug!(entries = entries.len(), "Listing command completed");
        Ok(entries)
    }
}
