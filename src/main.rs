use aerodesk::{
    api, bootstrap,
    cli::{self, output::Output, AgentCommands, Cli, Commands},
    utils::toml_config::{AerodeskConfig, ConfigError, LogFormat},
    AppState,
};
use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over the configured level; `--verbose` forces debug.
fn init_logging(config: &AerodeskConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match config.logging.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .pretty()
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init(),
    }
}

/// Load the config file, falling back to defaults when it does not exist.
fn load_config(cli: &Cli, out: &Output) -> Result<AerodeskConfig> {
    match AerodeskConfig::load(&cli.config) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(path)) => {
            out.warning(&format!(
                "{} not found, using built-in defaults",
                path.display()
            ));
            Ok(AerodeskConfig::default())
        }
        Err(e) => {
            out.error(&e.to_string());
            Err(e).with_context(|| format!("invalid configuration in {}", cli.config.display()))
        }
    }
}

async fn shutdown_signal(state: AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested, aborting in-flight turns");
    state.begin_shutdown();
}

async fn serve(config: AerodeskConfig, out: &Output) -> Result<()> {
    out.banner();
    let state = bootstrap::build_state(config)
        .await
        .context("failed to build application")?;

    let addr = state.config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    out.success(&format!("Listening on http://{}", addr));
    info!(address = %addr, "Server started");

    let app = api::build_app(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let out = cli.output();

    match &cli.command {
        None | Some(Commands::Serve) => {
            let config = load_config(&cli, &out)?;
            init_logging(&config, cli.verbose);
            serve(config, &out).await
        }
        Some(Commands::Agents(command)) => {
            let config = load_config(&cli, &out)?;
            let registry = bootstrap::build_registry(&config)?;
            match command {
                AgentCommands::List => cli::list_agents(&out, &registry),
                AgentCommands::Show { name } => {
                    if !cli::show_agent(&out, &registry, name) {
                        std::process::exit(1);
                    }
                }
            }
            Ok(())
        }
        Some(Commands::Config { full, validate }) => {
            let config = AerodeskConfig::load(&cli.config).map_err(|e| {
                out.error(&e.to_string());
                e
            })?;
            if *validate {
                out.success(&format!("{} is valid", cli.config.display()));
                return Ok(());
            }
            if *full {
                println!("{}", toml::to_string_pretty(&config)?);
            } else {
                cli::print_config(&out, &config);
            }
            Ok(())
        }
    }
}
