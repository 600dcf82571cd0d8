//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. Global flags are merged over the `domainlens.toml` file and
//! environment variables; subcommands select what to run.

use crate::certs::FailurePolicy;
use clap::{Parser, Subcommand, ValueEnum};
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Certificate-transparency history and popularity-ranked domain suggestions.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (overrides the configuration file).
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Base URL of the crt.sh-compatible certificate search.
    #[arg(long, value_name = "URL", global = true)]
    pub crtsh_url: Option<String>,

    /// What to do when one of the certificate queries fails.
    #[arg(long, value_enum, value_name = "POLICY", global = true)]
    pub failure_policy: Option<FailurePolicyArg>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show certificates logged for a domain and its parent wildcard.
    Certs {
        /// The domain to look up, e.g. www.example.com
        domain: String,
    },
    /// Suggest popular domains completing a partial query.
    Suggest {
        /// The partial domain typed so far.
        query: String,
    },
    /// Show the most looked-up domains.
    Top {
        /// How many domains to show.
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
    /// Serve the JSON API.
    Serve {
        /// Address to listen on (overrides the configuration file).
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicyArg {
    FailFast,
    Degrade,
}

impl From<FailurePolicyArg> for FailurePolicy {
    fn from(arg: FailurePolicyArg) -> Self {
        match arg {
            FailurePolicyArg::FailFast => FailurePolicy::FailFast,
            FailurePolicyArg::Degrade => FailurePolicy::Degrade,
        }
    }
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut root = Dict::new();
        let mut certificates = Dict::new();

        if let Some(level) = &self.log_level {
            root.insert("log_level".into(), Value::from(level.clone()));
        }

        if let Some(url) = &self.crtsh_url {
            certificates.insert("base_url".into(), Value::from(url.clone()));
        }

        if let Some(policy) = self.failure_policy {
            let policy = match FailurePolicy::from(policy) {
                FailurePolicy::FailFast => "fail_fast",
                FailurePolicy::Degrade => "degrade",
            };
            certificates.insert("failure_policy".into(), Value::from(policy));
        }

        if !certificates.is_empty() {
            root.insert("certificates".into(), Value::from(certificates));
        }

        // `--json` only ever switches JSON on; leaving it off keeps the configured format.
        if self.json {
            let mut output = Dict::new();
            output.insert("format".into(), Value::from("json"));
            root.insert("output".into(), Value::from(output));
        }

        if let Some(Command::Serve {
            listen: Some(addr),
        }) = &self.command
        {
            let mut server = Dict::new();
            server.insert("listen_addr".into(), Value::from(addr.clone()));
            root.insert("server".into(), Value::from(server));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, root);
        Ok(map)
    }
}
