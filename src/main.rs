//! route-dispatch demo server.
//!
//! ```text
//!     Client Request
//!     ──────────▶ axum server ──▶ RequestContext ──▶ Dispatcher ──▶ handler
//!                                                      │
//!                                   exact map → hit cache → miss cache → scan
//! ```
//!
//! Boots a small route set and serves it until Ctrl+C:
//! - `GET /` greeting
//! - `GET /user/:user` path parameter echo
//! - `POST /` JSON body echo

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use route_dispatch::config::{load_config, AppConfig};
use route_dispatch::lifecycle::startup;
use route_dispatch::observability::logging;
use route_dispatch::routing::{Handler, HandlerRegistry, HandlerResult};
use route_dispatch::{HttpServerProvider, Reply, RequestContext, Router};

#[derive(Parser)]
#[command(name = "route-dispatch")]
#[command(about = "Route registration and dispatch demo server", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the compiled route table as JSON and exit.
    #[arg(long)]
    list_routes: bool,
}

fn home(_ctx: &RequestContext) -> HandlerResult {
    Ok("Hello from route-dispatch!".into())
}

fn show_user(ctx: &RequestContext) -> HandlerResult {
    Ok(format!("Hello {}!", ctx.param_or("user", "stranger")).into())
}

async fn echo(ctx: RequestContext) -> HandlerResult {
    let body = ctx.use_body().await.clone();
    Ok(Reply::Json(body))
}

fn demo_routes(config: &AppConfig) -> Router {
    let mut router = Router::with_config(config.router).with_namespace("Demo");
    router.get("/", Handler::named("Home@index")).named("home");
    router.get("/user/:user", Handler::named("Home@user")).named("user");
    router.post("/", Handler::from_async_fn(echo)).named("echo");
    router
}

fn demo_handlers() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register("Demo::Home@index", Handler::from_fn(home))
        .register("Demo::Home@user", Handler::from_fn(show_user));
    registry
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    let router = demo_routes(&config);
    if cli.list_routes {
        println!("{}", router.compile()?.to_json()?);
        return Ok(());
    }

    logging::init_logging(&config.observability);
    tracing::info!(
        bind_address = %config.server.bind_address,
        env = %config.env,
        routes_cache_size = config.dispatch.routes_cache_size,
        not_found_cache_size = config.dispatch.not_found_cache_size,
        "Configuration loaded"
    );

    let provider = HttpServerProvider::new(config)
        .with_router(router)
        .with_resolver(Arc::new(demo_handlers()));

    startup::run(provider).await?;
    Ok(())
}
