//! Ordered application of a network configuration to the host

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio::time::Instant;

use osd_network_config::{ArtifactWriter, NetworkdGenerator, DEFAULT_NETWORK_DIR, DEFAULT_TIMESYNC_FILE};
use osd_network_core::{NetworkConfig, NetworkError, Result, SystemError};

use crate::cancel::Cancellation;
use crate::converge::{ConvergenceWaiter, QuorumPolicy};
use crate::system::{
    CommandRunner, EnvironmentControl, HostnameControl, HostnamectlControl, LinkStateProbe,
    NetworkctlProbe, SeedFileProbe, SeedProbe, ServiceControl, SystemCommandRunner,
    SystemdEnvironment, SystemdServiceControl,
};

const NETWORK_SERVICE: &str = "systemd-networkd";
const TIMESYNC_SERVICE: &str = "systemd-timesyncd";
const READINESS_PING_INTERVAL: Duration = Duration::from_millis(100);
/// Delay used when the device manager exposes no readiness check
const READINESS_FALLBACK_DELAY: Duration = Duration::from_secs(2);

/// Tunables for [`NetworkApplier`]
#[derive(Debug, Clone)]
pub struct ApplierSettings {
    pub network_dir: PathBuf,
    pub timesync_file: PathBuf,
    pub poll_interval: Duration,
    pub readiness_timeout: Duration,
}

impl Default for ApplierSettings {
    fn default() -> Self {
        Self {
            network_dir: PathBuf::from(DEFAULT_NETWORK_DIR),
            timesync_file: PathBuf::from(DEFAULT_TIMESYNC_FILE),
            poll_interval: Duration::from_millis(500),
            readiness_timeout: Duration::from_secs(10),
        }
    }
}

/// Host capabilities the applier drives
#[derive(Clone)]
pub struct Capabilities {
    pub commands: Arc<dyn CommandRunner>,
    pub services: Arc<dyn ServiceControl>,
    pub hostname: Arc<dyn HostnameControl>,
    pub environment: Arc<dyn EnvironmentControl>,
    pub links: Arc<dyn LinkStateProbe>,
    pub seed: Arc<dyn SeedProbe>,
}

impl Capabilities {
    /// Process-backed capabilities for a real host.
    pub fn system(command_timeout: Duration, seed_file: impl Into<PathBuf>) -> Self {
        let commands: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new(command_timeout));
        Self {
            services: Arc::new(SystemdServiceControl::new(Arc::clone(&commands))),
            hostname: Arc::new(HostnamectlControl::new(Arc::clone(&commands))),
            environment: Arc::new(SystemdEnvironment::new(Arc::clone(&commands))),
            links: Arc::new(NetworkctlProbe::new(Arc::clone(&commands))),
            seed: Arc::new(SeedFileProbe::new(seed_file)),
            commands,
        }
    }
}

/// Applies configurations through artifact generation, udev and systemd.
pub struct NetworkApplier {
    caps: Capabilities,
    generator: NetworkdGenerator,
    writer: ArtifactWriter,
    waiter: ConvergenceWaiter,
    readiness_timeout: Duration,
    /// Held for the whole of each apply
    apply_lock: Mutex<()>,
}

impl NetworkApplier {
    pub fn new(caps: Capabilities, settings: ApplierSettings) -> Self {
        let waiter = ConvergenceWaiter::new(Arc::clone(&caps.links))
            .with_poll_interval(settings.poll_interval);
        Self {
            writer: ArtifactWriter::new(settings.network_dir, settings.timesync_file),
            generator: NetworkdGenerator::new(),
            waiter,
            readiness_timeout: settings.readiness_timeout,
            caps,
            apply_lock: Mutex::new(()),
        }
    }

    /// Policy implied by the presence of a network seed.
    pub fn default_policy(&self) -> QuorumPolicy {
        if self.caps.seed.network_seed_exists() {
            QuorumPolicy::All
        } else {
            QuorumPolicy::Any
        }
    }

    pub fn waiter(&self) -> &ConvergenceWaiter {
        &self.waiter
    }

    pub fn services(&self) -> &Arc<dyn ServiceControl> {
        &self.caps.services
    }

    /// Apply `config`, choosing the convergence policy from the seed probe.
    pub async fn apply(&self, config: &NetworkConfig, timeout: Duration, cancel: &Cancellation) -> Result<()> {
        let policy = self.default_policy();
        self.apply_with_policy(config, timeout, policy, cancel).await
    }

    /// Apply `config` and wait for it to converge under `policy`.
    pub async fn apply_with_policy(
        &self,
        config: &NetworkConfig,
        timeout: Duration,
        policy: QuorumPolicy,
        cancel: &Cancellation,
    ) -> Result<()> {
        let _guard = self.apply_lock.lock().await;

        let hostname = config.hostname();
        info!("Setting hostname to '{}'", hostname);
        self.caps.hostname.set_hostname(&hostname).await?;

        info!("Updating proxy environment");
        self.caps.environment.update_proxy(config.proxy.clone()).await?;

        let artifacts = self.generator.generate(config);
        for artifact in artifacts.iter() {
            debug!("Generated {}", artifact.name);
        }
        self.writer.write(&artifacts).await?;

        self.wait_for_device_manager(cancel).await?;

        info!("Triggering device re-enumeration");
        self.run_command("udevadm", &["trigger", "--action=add"]).await?;
        self.run_command("udevadm", &["settle"]).await?;

        info!("Restarting {}", NETWORK_SERVICE);
        self.caps.services.restart(NETWORK_SERVICE).await?;
        info!("Restarting {}", TIMESYNC_SERVICE);
        self.caps.services.restart(TIMESYNC_SERVICE).await?;

        self.waiter.wait(config, timeout, policy, cancel).await
    }

    async fn run_command(&self, program: &str, args: &[&str]) -> Result<String> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.caps.commands.run(program, &args).await
    }

    /// Block until udev answers a ping, or sleep a fixed delay when no
    /// ping is available at all.
    async fn wait_for_device_manager(&self, cancel: &Cancellation) -> Result<()> {
        let deadline = Instant::now() + self.readiness_timeout;

        loop {
            if cancel.is_cancelled() {
                return Err(NetworkError::Cancelled);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            let ping = self.run_command("udevadm", &["control", "--ping"]);
            let Ok(answer) = tokio::time::timeout(remaining, ping).await else {
                return Err(SystemError::DeviceManagerNotReady {
                    timeout: self.readiness_timeout,
                }
                .into());
            };

            match answer {
                Ok(_) => {
                    debug!("Device manager is ready");
                    return Ok(());
                }
                Err(NetworkError::System(SystemError::CommandSpawn { .. })) => {
                    warn!(
                        "Device manager readiness cannot be queried, waiting {:?}",
                        READINESS_FALLBACK_DELAY
                    );
                    return self.sleep(READINESS_FALLBACK_DELAY, cancel).await;
                }
                Err(e) => debug!("Device manager not ready yet: {}", e),
            }

            if Instant::now() + READINESS_PING_INTERVAL > deadline {
                return Err(SystemError::DeviceManagerNotReady {
                    timeout: self.readiness_timeout,
                }
                .into());
            }
            self.sleep(READINESS_PING_INTERVAL, cancel).await?;
        }
    }

    async fn sleep(&self, duration: Duration, cancel: &Cancellation) -> Result<()> {
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = cancel.cancelled() => Err(NetworkError::Cancelled),
        }
    }
}
