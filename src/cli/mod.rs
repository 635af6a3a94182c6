//! CLI for the aerodesk-server binary
//!
//! clap for argument parsing, owo-colors (through [`output::Output`]) for
//! terminal output.

pub mod output;

use crate::agents::AgentRegistry;
use crate::utils::toml_config::{AerodeskConfig, StoreBackend};
use clap::{Parser, Subcommand};
use output::Output;
use std::path::PathBuf;

/// Aerodesk - multi-agent airline customer service server
#[derive(Parser, Debug)]
#[command(
    name = "aerodesk-server",
    version,
    about = "Aerodesk - multi-agent airline customer service server",
    long_about = "Serves airline customer-service conversations handled by a triage agent and\n\
                  specialist agents, with input and output guardrails on every turn.\n\n\
                  Run without a command to start the server.",
    after_help = "EXAMPLES:\n    \
                  aerodesk-server                       # Start the server (reads aerodesk.toml)\n    \
                  aerodesk-server --config prod.toml    # Use a custom config file\n    \
                  aerodesk-server agents list           # List the agent registry\n    \
                  aerodesk-server config --validate     # Check the config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "aerodesk.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Inspect the agent registry
    #[command(subcommand)]
    Agents(AgentCommands),

    /// Show configuration information
    Config {
        /// Print the full effective configuration as TOML
        #[arg(short = 'f', long)]
        full: bool,

        /// Only validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    /// List all agents
    List,

    /// Show details for one agent
    Show {
        /// Name of the agent, e.g. "Seat Booking Agent"
        name: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn output(&self) -> Output {
        if self.no_color {
            Output::no_color()
        } else {
            Output::new()
        }
    }
}

fn joined(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

/// `agents list`
pub fn list_agents(out: &Output, registry: &AgentRegistry) {
    out.header("Agents");
    out.table_header(&["Name", "Tools", "Handoffs"]);
    let default = registry.default_agent().name.clone();
    for info in registry.agent_infos() {
        let name = if info.name == default {
            format!("{} *", info.name)
        } else {
            info.name.clone()
        };
        out.table_row(&[
            &name,
            &info.tools.len().to_string(),
            &info.handoffs.len().to_string(),
        ]);
    }
    out.hint("* marks the default agent");
}

/// `agents show NAME`; returns false if no such agent exists.
pub fn show_agent(out: &Output, registry: &AgentRegistry, name: &str) -> bool {
    let Some(agent) = registry.get(name) else {
        out.error(&format!("No agent named '{}'", name));
        out.info(&format!("Known agents: {}", registry.agent_names().join(", ")));
        return false;
    };

    let info = agent.info();
    out.header(&info.name);
    out.kv("description", &info.description);
    out.kv("tools", &joined(&info.tools));
    out.kv("handoffs", &joined(&info.handoffs));
    out.kv("input guardrails", &joined(&info.input_guardrails));
    out.kv("output guardrails", &joined(&info.output_guardrails));
    true
}

/// `config`: summary of the effective configuration.
pub fn print_config(out: &Output, config: &AerodeskConfig) {
    out.header("Configuration");

    out.subheader("Server");
    out.kv("bind", &config.bind_address());
    out.kv("cors origins", &joined(&config.server.cors_origins));

    out.subheader("Model");
    out.kv("api base", &config.llm.api_base);
    out.kv("agent model", &config.llm.model);
    out.kv("guardrail model", &config.llm.guardrail_model);
    out.kv("max turns", &config.llm.max_turns.to_string());
    let key_status = if config.llm.api_key().is_some() {
        "set"
    } else {
        "missing"
    };
    out.kv(&config.llm.api_key_env, key_status);

    out.subheader("Orchestrator");
    out.kv(
        "input guardrail mode",
        &format!("{:?}", config.orchestrator.input_guardrail_mode),
    );
    out.kv("refusal", &config.orchestrator.refusal_message);

    out.subheader("Store");
    match config.store.backend {
        StoreBackend::Memory => out.kv("backend", "memory"),
        StoreBackend::File => {
            out.kv("backend", "file");
            let path = config
                .store
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            out.kv("path", &path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::airline::airline_registry;
    use crate::guardrails::GuardrailSet;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_serve_without_command() {
        let cli = Cli::try_parse_from(["aerodesk-server"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("aerodesk.toml"));
    }

    #[test]
    fn test_agents_show_parses_name() {
        let cli = Cli::try_parse_from([
            "aerodesk-server",
            "--no-color",
            "agents",
            "show",
            "FAQ Agent",
        ])
        .unwrap();
        assert!(cli.no_color);
        match cli.command {
            Some(Commands::Agents(AgentCommands::Show { name })) => assert_eq!(name, "FAQ Agent"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_show_unknown_agent_reports_false() {
        let registry = airline_registry(&GuardrailSet::new()).unwrap();
        let out = Output::no_color();
        assert!(show_agent(&out, &registry, "Triage Agent"));
        assert!(!show_agent(&out, &registry, "Lounge Agent"));
    }

    #[test]
    fn test_print_config_does_not_panic() {
        print_config(&Output::no_color(), &AerodeskConfig::default());
    }
}
