//! OSD Network CLI (osdnet)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use osd_network_apply::{
    Capabilities, ConvergenceWaiter, NetworkApplier, NetworkState, NetworkctlProbe,
    QuorumPolicy, SystemCommandRunner,
};
use osdnet::commands::{
    interrupt_cancellation, ApplyCommand, RenderCommand, ServeCommand, ValidateCommand,
    WaitCommand,
};
use osdnet::settings::{DaemonSettings, DEFAULT_SETTINGS_FILE};

#[derive(Parser)]
#[command(name = "osdnet")]
#[command(about = "OSD host network management")]
#[command(version)]
#[command(long_about = "
OSD host network management

Renders network configurations into systemd-networkd units, applies them to
the host and serves the network configuration API.

Examples:
  osdnet render -c network.json            # Print the generated units
  osdnet render -c network.json -o out/    # Write the units to out/
  osdnet validate -c network.json          # Check a configuration
  osdnet apply -c network.json             # Apply and wait for the network
  osdnet wait -c network.json --require-all
  osdnet serve                             # Run the daemon
")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Daemon settings file
    #[arg(short, long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print or write the systemd-networkd units for a configuration
    Render {
        /// Network configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Directory to write the units to instead of printing them
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a network configuration
    Validate {
        /// Network configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Apply a network configuration to this host
    Apply {
        /// Network configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Seconds to wait for the network to come up
        #[arg(short, long, default_value_t = 60)]
        timeout: u64,

        /// Require every configured device to be routable
        #[arg(long, conflicts_with = "require_any")]
        require_all: bool,

        /// Require one routable device per category
        #[arg(long)]
        require_any: bool,
    },

    /// Wait for the devices of a configuration to become routable
    Wait {
        /// Network configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Seconds to wait
        #[arg(short, long, default_value_t = 60)]
        timeout: u64,

        /// Require every configured device to be routable
        #[arg(long)]
        require_all: bool,
    },

    /// Run the network daemon
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let result = run(&cli).await;

    match result {
        Ok(()) => {
            if !cli.quiet {
                log::info!("Command completed successfully");
            }
            std::process::exit(0);
        }
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {}", e);

                if cli.verbose || cli.debug {
                    for cause in e.chain().skip(1) {
                        eprintln!("  Caused by: {}", cause);
                    }
                }
            }
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let settings = DaemonSettings::load(&cli.settings)
        .with_context(|| format!("Failed to load settings from {}", cli.settings.display()))?;

    match &cli.command {
        Commands::Render { config, output } => {
            RenderCommand::new()
                .execute(config, output.as_deref())
                .await
        }

        Commands::Validate { config } => ValidateCommand::new().execute(config),

        Commands::Apply {
            config,
            timeout,
            require_all,
            require_any,
        } => {
            let policy = match (*require_all, *require_any) {
                (true, _) => Some(QuorumPolicy::All),
                (_, true) => Some(QuorumPolicy::Any),
                _ => None,
            };
            let cmd = ApplyCommand::new(system_applier(&settings));
            cmd.execute(
                config,
                Duration::from_secs(*timeout),
                policy,
                &interrupt_cancellation(),
            )
            .await
        }

        Commands::Wait {
            config,
            timeout,
            require_all,
        } => {
            let runner = Arc::new(SystemCommandRunner::new(settings.command_timeout()));
            let waiter = ConvergenceWaiter::new(Arc::new(NetworkctlProbe::new(runner)))
                .with_poll_interval(settings.applier_settings().poll_interval);
            let policy = if *require_all {
                QuorumPolicy::All
            } else {
                QuorumPolicy::Any
            };
            WaitCommand::new(waiter)
                .execute(
                    config,
                    Duration::from_secs(*timeout),
                    policy,
                    &interrupt_cancellation(),
                )
                .await
        }

        Commands::Serve => {
            let state = NetworkState::new(system_applier(&settings))
                .with_rollback_on_failure(settings.rollback_on_failure);
            ServeCommand::new(settings, Arc::new(state)).execute().await
        }
    }
}

fn system_applier(settings: &DaemonSettings) -> Arc<NetworkApplier> {
    let caps = Capabilities::system(
        settings.command_timeout(),
        settings.network_seed_file.clone(),
    );
    Arc::new(NetworkApplier::new(caps, settings.applier_settings()))
}
