//! `mirage-route`: show how the proxy would route a single request.

use anyhow::{Context, Result};
use clap::Parser;
use hyper::Request;
use mirage_core::simulation::{InMemorySimulationStore, SimulationView};
use mirage_core::{DecisionEngine, RequestDetails, RoutingConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mirage-route", version, about)]
struct Args {
    /// Routing configuration (YAML)
    #[arg(short, long, env = "MIRAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Simulation to match against (JSON)
    #[arg(short, long, env = "MIRAGE_SIMULATION")]
    simulation: Option<PathBuf>,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Request header, `Name: value`. May be repeated.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body
    #[arg(short, long, default_value = "")]
    body: String,

    /// Send unmatched requests upstream through the chosen client
    #[arg(long)]
    send: bool,

    /// Absolute request URL
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mirage_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RoutingConfig::from_file(path)?,
        None => RoutingConfig::default(),
    };

    let store = match &args.simulation {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read simulation {}", path.display()))?;
            InMemorySimulationStore::with_pairs(SimulationView::from_json(&json)?.compile()?)
        }
        None => InMemorySimulationStore::new(),
    };

    let engine = DecisionEngine::from_config(&config, Arc::new(store))?;

    let mut builder = Request::builder()
        .method(args.method.as_str())
        .uri(args.url.as_str());
    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("Header '{header}' is not 'Name: value'"))?;
        builder = builder.header(name.trim(), value.trim());
    }
    let request = builder.body(()).context("Invalid request")?;
    let details = RequestDetails::from_request(&request, args.body.as_bytes(), "http");

    let decision = engine.decide(&details)?;

    match decision.client.proxy() {
        Some(proxy) => println!("route:  proxy {proxy}"),
        None => println!("route:  direct"),
    }

    match &decision.matched {
        Some(pair) => {
            let response = pair.response.to_response()?;
            println!("match:  {} (simulated)", response.status().as_u16());
        }
        None if args.send => {
            let method = reqwest::Method::from_bytes(args.method.as_bytes())?;
            let response = decision
                .client
                .http()
                .request(method, args.url.as_str())
                .headers(request.headers().clone())
                .body(args.body.clone())
                .send()
                .await
                .context("Upstream request failed")?;
            println!("match:  none");
            println!("live:   {}", response.status().as_u16());
        }
        None => println!("match:  none"),
    }

    Ok(())
}
