//! Host capabilities used while applying a configuration
//!
//! Each capability is a narrow trait so the applier can be exercised
//! against fakes. The real implementations shell out to the usual systemd
//! tools through a [`CommandRunner`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::timeout;

use osd_network_core::{NetworkError, ProxyConfig, Result, SystemError};

/// Proxy variables cleared on every update, in both spellings
const PROXY_VARIABLES: &[&str] = &[
    "http_proxy",
    "https_proxy",
    "no_proxy",
    "all_proxy",
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "NO_PROXY",
    "ALL_PROXY",
];

/// Runs external programs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and return its standard output.
    async fn run(&self, program: &str, args: &[String]) -> Result<String>;
}

/// Controls systemd units.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceControl: Send + Sync {
    async fn restart(&self, unit: &str) -> Result<()>;

    /// Enable `units`, starting them as well when `now` is set.
    async fn enable(&self, units: &[String], now: bool) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostnameControl: Send + Sync {
    /// Set the static hostname; an empty name restores the default.
    async fn set_hostname(&self, hostname: &str) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnvironmentControl: Send + Sync {
    /// Install proxy variables for the service manager, or clear them on `None`.
    async fn update_proxy(&self, proxy: Option<ProxyConfig>) -> Result<()>;
}

/// Reports whether a network device has reached the routable state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkStateProbe: Send + Sync {
    async fn is_routable(&self, device: &str) -> bool;
}

/// Tells first-boot provisioning apart from live reconfiguration.
#[cfg_attr(test, mockall::automock)]
pub trait SeedProbe: Send + Sync {
    fn network_seed_exists(&self) -> bool;
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    /// Upper bound on a single command invocation
    command_timeout: Duration,
}

impl SystemCommandRunner {
    pub fn new(command_timeout: Duration) -> Self {
        Self { command_timeout }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String> {
        let command = std::iter::once(program)
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Executing `{}`", command);

        match timeout(self.command_timeout, cmd.output()).await {
            Ok(Ok(output)) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                    warn!(
                        "`{}` failed with exit code {:?}: {}",
                        command,
                        output.status.code(),
                        stderr
                    );
                    Err(SystemError::CommandFailed {
                        command,
                        code: output.status.code(),
                        stderr,
                    }
                    .into())
                }
            }
            Ok(Err(source)) => Err(SystemError::CommandSpawn { command, source }.into()),
            Err(_) => Err(SystemError::CommandTimeout {
                command,
                timeout: self.command_timeout,
            }
            .into()),
        }
    }
}

/// [`ServiceControl`] over `systemctl`.
#[derive(Clone)]
pub struct SystemdServiceControl {
    runner: Arc<dyn CommandRunner>,
}

impl SystemdServiceControl {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

fn service_error(unit: &str, operation: &str, err: NetworkError) -> NetworkError {
    SystemError::Service {
        unit: unit.to_string(),
        operation: operation.to_string(),
        message: err.to_string(),
    }
    .into()
}

#[async_trait]
impl ServiceControl for SystemdServiceControl {
    async fn restart(&self, unit: &str) -> Result<()> {
        self.runner
            .run("systemctl", &to_args(&["restart", unit]))
            .await
            .map_err(|e| service_error(unit, "restart", e))?;
        Ok(())
    }

    async fn enable(&self, units: &[String], now: bool) -> Result<()> {
        if units.is_empty() {
            return Ok(());
        }

        let mut args = vec!["enable".to_string()];
        if now {
            args.push("--now".to_string());
        }
        args.extend(units.iter().cloned());

        self.runner
            .run("systemctl", &args)
            .await
            .map_err(|e| service_error(&units.join(" "), "enable", e))?;
        Ok(())
    }
}

/// [`HostnameControl`] over `hostnamectl`.
#[derive(Clone)]
pub struct HostnamectlControl {
    runner: Arc<dyn CommandRunner>,
}

impl HostnamectlControl {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl HostnameControl for HostnamectlControl {
    async fn set_hostname(&self, hostname: &str) -> Result<()> {
        self.runner
            .run("hostnamectl", &to_args(&["set-hostname", hostname]))
            .await?;
        Ok(())
    }
}

/// [`EnvironmentControl`] over the service manager's environment block.
pub struct SystemdEnvironment {
    runner: Arc<dyn CommandRunner>,
    /// Keys installed by the previous update
    installed: Mutex<BTreeSet<String>>,
}

impl SystemdEnvironment {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            installed: Mutex::new(BTreeSet::new()),
        }
    }
}

#[async_trait]
impl EnvironmentControl for SystemdEnvironment {
    async fn update_proxy(&self, proxy: Option<ProxyConfig>) -> Result<()> {
        let mut installed = self.installed.lock().await;
        let variables = proxy.map(|p| p.variables).unwrap_or_default();

        let stale: Vec<String> = PROXY_VARIABLES
            .iter()
            .map(|s| s.to_string())
            .chain(installed.iter().cloned())
            .filter(|key| !variables.contains_key(key))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut args = vec!["unset-environment".to_string()];
        args.extend(stale);
        self.runner.run("systemctl", &args).await?;

        if !variables.is_empty() {
            let mut args = vec!["set-environment".to_string()];
            args.extend(variables.iter().map(|(k, v)| format!("{}={}", k, v)));
            self.runner.run("systemctl", &args).await?;
        }

        *installed = variables.into_keys().collect();
        Ok(())
    }
}

/// [`LinkStateProbe`] reading `networkctl status`.
#[derive(Clone)]
pub struct NetworkctlProbe {
    runner: Arc<dyn CommandRunner>,
}

impl NetworkctlProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl LinkStateProbe for NetworkctlProbe {
    async fn is_routable(&self, device: &str) -> bool {
        match self
            .runner
            .run("networkctl", &to_args(&["status", device]))
            .await
        {
            Ok(output) => output.contains("State: routable"),
            Err(e) => {
                debug!("Status query for {} failed: {}", device, e);
                false
            }
        }
    }
}

/// [`SeedProbe`] answering whether the provisioning seed file was present
/// when the probe was created, which is at daemon start.
#[derive(Debug, Clone)]
pub struct SeedFileProbe {
    path: PathBuf,
    present: bool,
}

impl SeedFileProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let present = path.exists();
        debug!("Network seed {} present: {}", path.display(), present);
        Self { path, present }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SeedProbe for SeedFileProbe {
    fn network_seed_exists(&self) -> bool {
        self.present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn args(list: &[&str]) -> Vec<String> {
        to_args(list)
    }

    #[tokio::test]
    async fn test_system_runner_captures_stdout() {
        let runner = SystemCommandRunner::default();
        let output = runner.run("echo", &args(&["routable"])).await.unwrap();
        assert_eq!(output.trim(), "routable");
    }

    #[tokio::test]
    async fn test_system_runner_errors() {
        let runner = SystemCommandRunner::new(Duration::from_millis(100));

        match runner.run("false", &[]).await {
            Err(NetworkError::System(SystemError::CommandFailed { code, .. })) => {
                assert_eq!(code, Some(1))
            }
            other => panic!("unexpected result {:?}", other),
        }

        assert!(matches!(
            runner.run("/nonexistent/osd-network-test", &[]).await,
            Err(NetworkError::System(SystemError::CommandSpawn { .. }))
        ));

        assert!(matches!(
            runner.run("sleep", &args(&["5"])).await,
            Err(NetworkError::System(SystemError::CommandTimeout { .. }))
        ));
    }

    #[tokio::test]
    async fn test_restart_failure_names_unit() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .with(eq("systemctl"), eq(args(&["restart", "systemd-networkd"])))
            .times(1)
            .returning(|_, _| {
                Err(SystemError::CommandFailed {
                    command: "systemctl".into(),
                    code: Some(5),
                    stderr: "unit not found".into(),
                }
                .into())
            });

        let control = SystemdServiceControl::new(Arc::new(runner));
        match control.restart("systemd-networkd").await {
            Err(NetworkError::System(SystemError::Service { unit, operation, message })) => {
                assert_eq!(unit, "systemd-networkd");
                assert_eq!(operation, "restart");
                assert!(message.contains("unit not found"));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_enable_units() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .with(eq("systemctl"), eq(args(&["enable", "--now", "a.socket", "b.service"])))
            .times(1)
            .returning(|_, _| Ok(String::new()));

        let control = SystemdServiceControl::new(Arc::new(runner));
        control
            .enable(&args(&["a.socket", "b.service"]), true)
            .await
            .unwrap();
        // No units means no command at all
        control.enable(&[], true).await.unwrap();
    }

    #[tokio::test]
    async fn test_proxy_update_clears_previous_keys() {
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);

        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(move |program, args| {
            assert_eq!(program, "systemctl");
            recorded.lock().unwrap().push(args.to_vec());
            Ok(String::new())
        });

        let env = SystemdEnvironment::new(Arc::new(runner));
        env.update_proxy(Some(ProxyConfig::new([
            ("https_proxy".to_string(), "http://proxy:3128".to_string()),
            ("PIP_INDEX_URL".to_string(), "http://mirror/simple".to_string()),
        ])))
        .await
        .unwrap();
        env.update_proxy(None).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);

        assert_eq!(calls[0][0], "unset-environment");
        assert!(!calls[0].contains(&"https_proxy".to_string()));
        assert!(calls[0].contains(&"HTTPS_PROXY".to_string()));

        assert_eq!(
            calls[1],
            args(&[
                "set-environment",
                "PIP_INDEX_URL=http://mirror/simple",
                "https_proxy=http://proxy:3128"
            ])
        );

        assert_eq!(calls[2][0], "unset-environment");
        assert!(calls[2].contains(&"PIP_INDEX_URL".to_string()));
        assert!(calls[2].contains(&"https_proxy".to_string()));
    }

    #[tokio::test]
    async fn test_networkctl_probe() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .with(eq("networkctl"), eq(args(&["status", "uplink"])))
            .returning(|_, _| Ok("  Type: bridge\n  State: routable (configured)\n".into()));
        runner
            .expect_run()
            .with(eq("networkctl"), eq(args(&["status", "storage"])))
            .returning(|_, _| Ok("  State: degraded (configuring)\n".into()));
        runner
            .expect_run()
            .with(eq("networkctl"), eq(args(&["status", "missing"])))
            .returning(|_, _| {
                Err(SystemError::CommandFailed {
                    command: "networkctl".into(),
                    code: Some(1),
                    stderr: "Interface \"missing\" not found.".into(),
                }
                .into())
            });

        let probe = NetworkctlProbe::new(Arc::new(runner));
        assert!(probe.is_routable("uplink").await);
        assert!(!probe.is_routable("storage").await);
        assert!(!probe.is_routable("missing").await);
    }

    #[test]
    fn test_seed_file_probe() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let seed = temp_dir.path().join("network.json");
        let absent = SeedFileProbe::new(&seed);
        assert!(!absent.network_seed_exists());

        std::fs::write(&seed, "{}").unwrap();
        let present = SeedFileProbe::new(&seed);
        assert!(present.network_seed_exists());
        assert_eq!(present.path(), seed.as_path());

        // The answer is fixed at creation
        assert!(!absent.network_seed_exists());
        std::fs::remove_file(&seed).unwrap();
        assert!(present.network_seed_exists());
    }
}
