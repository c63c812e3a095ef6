use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use edge_gateway::auth::AuthorizationPolicy;
use edge_gateway::config::{load_config, AccessConfig, GatewayConfig};
use edge_gateway::http::CorsPolicy;
use edge_gateway::routing::RouteTable;

#[derive(Parser)]
#[command(name = "gateway-check")]
#[command(about = "Validate and inspect an edge-gateway configuration", long_about = None)]
struct Cli {
    /// Path to the gateway configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the configuration and report every problem found
    Validate,
    /// Print the compiled route table in evaluation order
    Routes,
    /// Print the authorization rules and trusted issuers
    Policy,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{}: {}", cli.config.display(), error);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Validate => validate(&config),
        Commands::Routes => routes(&config),
        Commands::Policy => policy(&config),
    }
}

/// Semantic validation already ran inside `load_config`; compiling the
/// pipeline values catches what only compilation can (regex nuances,
/// header encoding), the same checks `HttpServer::new` performs.
fn validate(config: &GatewayConfig) -> ExitCode {
    let mut failed = false;

    if let Err(error) = RouteTable::from_config(&config.routes) {
        eprintln!("routes: {}", error);
        failed = true;
    }
    if let Err(error) = AuthorizationPolicy::from_config(&config.authorization.rules) {
        eprintln!("authorization.rules: {}", error);
        failed = true;
    }
    if let Err(error) = CorsPolicy::from_config(&config.cors) {
        eprintln!("cors: {}", error);
        failed = true;
    }

    if failed {
        ExitCode::FAILURE
    } else {
        println!("{}: ok", config.listener.bind_address);
        println!(
            "{} routes, {} rules, {} issuers",
            config.routes.len(),
            config.authorization.rules.len(),
            config.auth.issuers.len()
        );
        ExitCode::SUCCESS
    }
}

fn routes(config: &GatewayConfig) -> ExitCode {
    let table = match RouteTable::from_config(&config.routes) {
        Ok(table) => table,
        Err(error) => {
            eprintln!("routes: {}", error);
            return ExitCode::FAILURE;
        }
    };

    for route in table.routes() {
        let method = route
            .method
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "*".to_string());
        let patterns: Vec<&str> = route.patterns.iter().map(|p| p.as_str()).collect();
        println!(
            "{:<16} {:<7} {:<40} -> {}",
            route.id,
            method,
            patterns.join(", "),
            route.upstream
        );
    }
    ExitCode::SUCCESS
}

fn policy(config: &GatewayConfig) -> ExitCode {
    println!("authorization rules:");
    for rule in &config.authorization.rules {
        let method = rule.method.as_deref().unwrap_or("*");
        let access = match rule.access {
            AccessConfig::Public => "public",
            AccessConfig::Authenticated => "authenticated",
        };
        println!("  {:<7} {:<40} {}", method, rule.path, access);
    }
    println!("  (anything unmatched is public)");

    println!("trusted issuers:");
    for issuer in &config.auth.issuers {
        println!("  {} (keys: {})", issuer.issuer, issuer.jwks_url);
    }
    ExitCode::SUCCESS
}
