//! Agent router command line
//!
//! Inspects a router configuration without running any agents: validates it,
//! dry-runs candidate search, and evaluates requirements.

use agent_router::agent::{Agent, AgentInput, AgentResponse};
use agent_router::config::RouterConfig;
use agent_router::context::{ContextValue, ConversationContext, Requirement, RoutingContext};
use agent_router::directory::{AgentDirectory, SearchOptions, WILDCARD_ROLE};
use agent_router::error::{RouterError, RouterResult};
use agent_router::observability::init_default_logging;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "agent-router")]
#[command(about = "Route messages to the best matching agent")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "AGENT_ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration
    Config {
        /// Print the parsed configuration
        #[arg(long)]
        show: bool,
        /// Print the JSON Schema of the configuration file
        #[arg(long)]
        schema: bool,
    },
    /// Rank the configured agents for a role and context
    Search {
        /// Role or agent name; every agent when omitted
        #[arg(long, default_value = WILDCARD_ROLE)]
        role: String,
        /// Task context entry, e.g. `languages=rust,go`
        #[arg(long = "context", value_name = "KEY=V1,V2")]
        context: Vec<String>,
        /// Only compare these context keys
        #[arg(long, value_delimiter = ',')]
        keys: Option<Vec<String>>,
    },
    /// Evaluate requirements against a context
    Check {
        /// Requirement as `name` or `name:condition`
        #[arg(long = "requirement", value_name = "NAME[:CONDITION]", required = true)]
        requirements: Vec<String>,
        /// Context entry, e.g. `stories=login,signup`
        #[arg(long = "context", value_name = "KEY=V1,V2")]
        context: Vec<String>,
    },
}

/// Stands in for a real agent so the directory can be ranked offline
struct PlaceholderAgent {
    name: String,
}

#[async_trait]
impl Agent for PlaceholderAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn receive_message(
        &self,
        _input: &AgentInput,
        _context: &mut ConversationContext,
    ) -> RouterResult<AgentResponse> {
        Err(RouterError::invalid_input(format!(
            "'{}' is a placeholder and cannot handle messages",
            self.name
        )))
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose > 0 && std::env::var("LOG_LEVEL").is_err() {
        let level = if cli.verbose > 1 { "TRACE" } else { "DEBUG" };
        std::env::set_var("LOG_LEVEL", level);
    }
    init_default_logging();

    let result = match cli.command {
        Commands::Config { schema: true, .. } => print_schema(),
        command => match load_configuration(&cli.config) {
            Ok(config) => run_command(command, config),
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn run_command(command: Commands, config: RouterConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Config { show, .. } => handle_config_command(config, show),
        Commands::Search {
            role,
            context,
            keys,
        } => handle_search_command(config, &role, &context, keys),
        Commands::Check {
            requirements,
            context,
        } => handle_check_command(config, &requirements, &context),
    }
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<RouterConfig, Box<dyn std::error::Error>> {
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        return Ok(RouterConfig::load_from_file(path)?);
    }

    for path_str in ["router.toml", "config/router.toml"] {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return Ok(RouterConfig::load_from_file(&path)?);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(RouterConfig::default())
}

fn print_schema() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&RouterConfig::json_schema())?);
    Ok(())
}

fn handle_config_command(
    config: RouterConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!(agents = config.agents.len(), "Configuration is valid");
    Ok(())
}

fn handle_search_command(
    config: RouterConfig,
    role: &str,
    context_args: &[String],
    keys: Option<Vec<String>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let directory = AgentDirectory::from_descriptors(config.agents.clone(), |descriptor| {
        Arc::new(PlaceholderAgent {
            name: descriptor.name.clone(),
        }) as Arc<dyn Agent>
    })?;

    let task = task_context(&config, context_args)?;
    let mut options = SearchOptions::new().with_context(task);
    if let Some(keys) = keys.or_else(|| config.router.context_keys.clone()) {
        options = options.with_context_keys(keys);
    }
    if !config.router.team.is_empty() {
        options = options.with_team(config.router.team.clone());
    }

    let ranked = directory.search_ranked(role, &options);
    if ranked.is_empty() {
        return Err(RouterError::not_found(role).into());
    }

    for (position, candidate) in ranked.iter().enumerate() {
        println!("{:>3}. {:<24} score {}", position + 1, candidate.name, candidate.score);
    }
    Ok(())
}

fn handle_check_command(
    config: RouterConfig,
    requirement_args: &[String],
    context_args: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let context = task_context(&config, context_args)?;
    let requirements: Vec<Requirement> = requirement_args
        .iter()
        .map(|raw| Requirement::parse(raw))
        .collect();

    let mut all_met = true;
    for requirement in &requirements {
        let met = context.satisfies(std::slice::from_ref(requirement));
        all_met &= met;
        let condition = requirement
            .condition
            .as_ref()
            .map(|condition| format!(":{}", condition))
            .unwrap_or_default();
        println!(
            "{} {}{}",
            if met { "met    " } else { "not met" },
            requirement.name,
            condition
        );
    }

    if !all_met {
        return Err("requirements not met".into());
    }
    Ok(())
}

/// Configured task context with the command-line entries merged in, normalised
/// the way registered profiles are
fn task_context(config: &RouterConfig, args: &[String]) -> Result<RoutingContext, RouterError> {
    Ok(config
        .context
        .merged(parse_context(args)?.as_map())
        .normalised())
}

/// Parse `key=v1,v2` arguments into a context
fn parse_context(args: &[String]) -> Result<RoutingContext, RouterError> {
    let mut context = RoutingContext::new();
    for arg in args {
        let (key, values) = arg.split_once('=').ok_or_else(|| {
            RouterError::invalid_input(format!("context entry '{}' must look like key=v1,v2", arg))
        })?;
        let values = values
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty());
        context.insert(key.trim(), ContextValue::list(values));
    }
    Ok(context)
}
