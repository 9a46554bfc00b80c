//! Devtools MCP Demo Host
//!
//! A small application that registers a few objects, loads its configuration
//! and exposes itself through the devtools MCP server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use figment::providers::Serialized;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use devtools_host::{CargoLockManifests, Container, HostEnvironment, ProcRuntimeProbe};
use devtools_types::{Environment, HostContext, ObjectRegistry, TypeDescriptor};

/// Devtools MCP demo host
#[derive(Parser, Debug)]
#[command(name = "devtools-mcp")]
#[command(about = "Expose application introspection over MCP", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lockfile listing the application's dependencies
    #[arg(long, default_value = "Cargo.lock")]
    lockfile: PathBuf,

    /// Override devtools.mcp.port
    #[arg(long)]
    port: Option<u16>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("devtools_mcp=info,devtools_host=info,tower_http=debug"));
    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting devtools-mcp demo host v{}", env!("CARGO_PKG_VERSION"));

    // Configuration: file, then APP_* variables, then CLI flags
    let mut figment = HostEnvironment::figment(args.config.as_deref());
    if let Some(port) = args.port {
        figment = figment.merge(Serialized::default("devtools.mcp.port", port));
    }
    let environment = Arc::new(HostEnvironment::from_figment(&figment)?);

    let profiles = environment.active_profiles();
    if profiles.is_empty() {
        info!("No active profiles");
    } else {
        info!("Active profiles: {}", profiles.join(", "));
    }

    let container = Container::new_shared();
    register_objects(&container, environment.clone())?;
    info!("Registered {} objects", container.len());

    let host = HostContext::new(
        container,
        environment,
        Arc::new(ProcRuntimeProbe::new()),
        Arc::new(CargoLockManifests::new(&args.lockfile)),
    );

    let handle = match devtools_mcp::start(host).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start MCP server: {}", e);
            return Err(e.into());
        }
    };

    let abort = handle.abort_handle();
    tokio::select! {
        _ = shutdown_signal() => {
            abort.abort();
        }
        result = handle.join() => {
            result?;
        }
    }

    info!("Shutdown complete");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Demo Objects
// ─────────────────────────────────────────────────────────────────────────────

trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Default)]
struct UtcClock;

impl Clock for UtcClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct Greeter {
    greeting: String,
}

impl Greeter {
    fn greet(&self, name: &str) -> String {
        format!("{}, {}!", self.greeting, name)
    }
}

#[allow(dead_code)]
struct Mailer {
    smtp_host: String,
}

fn register_objects(container: &Container, environment: Arc<HostEnvironment>) -> Result<()> {
    container.register_singleton(
        "clock",
        TypeDescriptor::of::<UtcClock>().implements(concat!(module_path!(), "::Clock")),
        || Ok(UtcClock),
    )?;

    let greeting = environment.property_or("greeter.greeting", "Hello");
    container.register_prototype("greeter", TypeDescriptor::of::<Greeter>(), move || {
        Ok(Greeter {
            greeting: greeting.clone(),
        })
    })?;

    // Fails until mail.smtp.host is configured; listed with an inline error
    container.register_singleton("mailer", TypeDescriptor::of::<Mailer>(), move || {
        environment
            .property("mail.smtp.host")
            .map(|smtp_host| Mailer { smtp_host })
            .ok_or_else(|| "mail.smtp.host is not configured".to_string())
    })?;

    if let Some(greeter) = container.get_object("greeter")?.downcast::<Greeter>() {
        info!("{} Clock reads {}", greeter.greet("devtools"), UtcClock.now());
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down...");
        },
    }
}
