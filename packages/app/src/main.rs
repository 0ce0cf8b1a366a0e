//! `armature-demo`: the demo client in a terminal.
//!
//! # Quick start
//!
//! ```sh
//! # Canned data, no network:
//! armature-demo --offline
//!
//! # Against a local API:
//! ARMATURE_API_BASE=http://127.0.0.1:8080 armature-demo
//! ```
//!
//! Type `help` at the prompt for the command list. Environment variables are
//! listed on [`armature_app::AppConfig`]; flags given here take precedence.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use armature::{Coordinator, NavigationStack, Registry};
use armature_app::{AppConfig, AppCoordinator, Command, Environment, Services, Shell};
use armature_net::NetworkService;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::{Builder, Runtime};

/// armature-demo: a tabbed client driven from the terminal
#[derive(Parser)]
#[command(name = "armature-demo", version, about, long_about = None)]
struct Cli {
    /// Deployment environment; selects the default API base.
    #[arg(long, value_enum)]
    env: Option<Environment>,

    /// API base URL, e.g. `https://api.example.com`.
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Version segment prefixed to every endpoint path.
    #[arg(long, value_name = "VERSION")]
    api_version: Option<String>,

    /// Whole-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Serve canned fixtures instead of making HTTP requests.
    #[arg(long)]
    offline: bool,

    /// Latency of simulated loads, in milliseconds.
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,
}

impl Cli {
    fn into_config(self) -> AppConfig {
        let mut config = AppConfig::from_env();
        if let Some(environment) = self.env {
            let base_overridden = config.api_base != config.environment.default_api_base();
            config.environment = environment;
            if !base_overridden {
                config.api_base = environment.default_api_base().to_string();
            }
        }
        if let Some(base) = self.api_base {
            config.api_base = base;
        }
        if let Some(version) = self.api_version {
            config.api_version = version;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = self.delay_ms {
            config.simulated_delay = Duration::from_millis(ms);
        }
        config.offline |= self.offline;
        config
    }
}

/// Worker pool that network exchanges run on.
fn background_runtime() -> Runtime {
    Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("armature-io")
        .enable_all()
        .build()
        .expect("failed to build background runtime")
}

fn main() {
    let config = Cli::parse().into_config();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .init();

    tracing::info!(
        "config: {} {} ({}), api {}{}",
        config.app_name,
        config.app_version,
        config.environment,
        config.api_base,
        if config.offline { " [offline]" } else { "" }
    );

    let background = background_runtime();

    // Containers, surfaces and coordinators live on this thread.
    let main = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build main runtime");

    let services = if config.offline {
        Services::offline(config)
    } else {
        let network = NetworkService::http(config.timeout)
            .unwrap_or_else(|e| panic!("failed to build HTTP client: {e}"));
        Services::new(network, config)
    };
    let services = Services {
        network: services.network.with_background(background.handle().clone()),
        ..services
    };

    let registry = Arc::new(Registry::new());
    services.register(&registry);

    main.block_on(run(registry));

    drop(main);
    background.shutdown_timeout(Duration::from_secs(1));
}

async fn run(registry: Arc<Registry>) {
    let root = Arc::new(NavigationStack::new());
    let app = AppCoordinator::new(Arc::clone(&root), registry);
    Arc::clone(&app).start();

    let shell = Shell::new(root, Arc::clone(&app));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    settle().await;
    print(&shell.screen());

    loop {
        prompt();
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("shell: failed to read stdin: {e}");
                break;
            }
        };

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        print(&shell.apply(&command));
        settle().await;
        print(&shell.screen());
    }

    tracing::info!("shell: exiting");
}

/// Give spawned container tasks a moment to publish before rendering.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
