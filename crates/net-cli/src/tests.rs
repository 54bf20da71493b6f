//! CLI command tests

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use osd_network_apply::{
    cancellation, Cancellation, Capabilities, CommandRunner, EnvironmentControl, HostnameControl,
    LinkStateProbe, NetworkApplier, NetworkState, SeedFileProbe, SeedProbe, ServiceControl,
};
use osd_network_core::{ProxyConfig, Result};

use crate::commands::{read_config, RenderCommand, ServeCommand, ValidateCommand};
use crate::settings::DaemonSettings;

const UPLINK: &str = r#"{
    "interfaces": [{"name": "uplink", "hwaddr": "aa:bb:cc:dd:ee:01", "addresses": ["dhcp4"]}],
    "dns": {"hostname": "node1"},
    "ntp": {"timeservers": ["pool.ntp.org"]}
}"#;

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

mod settings {
    use super::*;

    #[test]
    fn test_defaults_without_settings_file() {
        let temp_dir = TempDir::new().unwrap();
        let settings = DaemonSettings::load(&temp_dir.path().join("missing.toml")).unwrap();

        assert_eq!(settings, DaemonSettings::default());
        assert_eq!(settings.api_apply_timeout(), Duration::from_secs(10));
        assert_eq!(settings.boot_apply_timeout(), Duration::from_secs(60));
        assert!(settings.rollback_on_failure);
        assert!(settings.boot_units.is_empty());
    }

    #[test]
    fn test_settings_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(
            &temp_dir,
            "daemon.toml",
            r#"
network_config_dir = "/tmp/osd-network"
poll_interval_ms = 50
rollback_on_failure = false
boot_units = ["incus.socket", "incus-lxcfs.service"]
"#,
        );

        let settings = DaemonSettings::load(&path).unwrap();
        assert_eq!(settings.network_config_dir, PathBuf::from("/tmp/osd-network"));
        assert!(!settings.rollback_on_failure);
        assert_eq!(settings.boot_units, vec!["incus.socket", "incus-lxcfs.service"]);
        // Untouched fields keep their defaults
        assert_eq!(settings.readiness_timeout_secs, 10);

        let applier = settings.applier_settings();
        assert_eq!(applier.network_dir, PathBuf::from("/tmp/osd-network"));
        assert_eq!(applier.poll_interval, Duration::from_millis(50));
        assert_eq!(applier.readiness_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_malformed_settings_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(&temp_dir, "daemon.toml", "poll_interval_ms = \"soon\"");

        assert!(DaemonSettings::load(&path).is_err());
    }
}

mod commands {
    use super::*;

    #[test]
    fn test_read_config_missing_file() {
        let err = read_config(Path::new("/nonexistent/network.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_read_config_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(&temp_dir, "network.json", "{not json");

        let err = read_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_validate_accepts_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(&temp_dir, "network.json", UPLINK);

        ValidateCommand::new().execute(&path).unwrap();
    }

    #[test]
    fn test_validate_rejects_config_without_devices() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(&temp_dir, "network.json", r#"{"dns": {"hostname": "node1"}}"#);

        let err = ValidateCommand::new().execute(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("no devices"));
    }

    #[test]
    fn test_render_listing() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(&temp_dir, "network.json", UPLINK);

        let cmd = RenderCommand::new();
        let listing = RenderCommand::format(&cmd.generate(&path).unwrap());

        let first = listing.find("# 00-enaabbccddee01.link").unwrap();
        let later = listing.find("# 20-uplink.network").unwrap();
        assert!(first < later);
        assert!(listing.contains("Name=uplink"));
        assert!(listing.contains("# timesyncd.conf\n[Time]\nFallbackNTP=pool.ntp.org"));
    }

    #[tokio::test]
    async fn test_render_to_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_file(&temp_dir, "network.json", UPLINK);
        let output = temp_dir.path().join("out");

        RenderCommand::new()
            .execute(&path, Some(output.as_path()))
            .await
            .unwrap();

        assert!(output.join("00-enaabbccddee01.link").exists());
        assert!(output.join("20-uplink.network").exists());
        assert!(output.join("timesyncd.conf").exists());
    }
}

/// Host double for the boot sequence
#[derive(Default)]
struct BootHost {
    routable: HashSet<String>,
    enabled: Mutex<Vec<(Vec<String>, bool)>>,
    hostnames: Mutex<Vec<String>>,
}

#[async_trait]
impl CommandRunner for BootHost {
    async fn run(&self, _program: &str, _args: &[String]) -> Result<String> {
        Ok(String::new())
    }
}

#[async_trait]
impl ServiceControl for BootHost {
    async fn restart(&self, _unit: &str) -> Result<()> {
        Ok(())
    }

    async fn enable(&self, units: &[String], now: bool) -> Result<()> {
        self.enabled.lock().unwrap().push((units.to_vec(), now));
        Ok(())
    }
}

#[async_trait]
impl HostnameControl for BootHost {
    async fn set_hostname(&self, hostname: &str) -> Result<()> {
        self.hostnames.lock().unwrap().push(hostname.to_string());
        Ok(())
    }
}

#[async_trait]
impl EnvironmentControl for BootHost {
    async fn update_proxy(&self, _proxy: Option<ProxyConfig>) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl LinkStateProbe for BootHost {
    async fn is_routable(&self, device: &str) -> bool {
        self.routable.contains(device)
    }
}

impl SeedProbe for BootHost {
    fn network_seed_exists(&self) -> bool {
        false
    }
}

mod boot {
    use super::*;

    struct Daemon {
        temp_dir: TempDir,
        host: Arc<BootHost>,
        state: Arc<NetworkState>,
        settings: DaemonSettings,
    }

    impl Daemon {
        fn new(routable: &[&str]) -> Self {
            let temp_dir = TempDir::new().unwrap();
            let host = Arc::new(BootHost {
                routable: routable.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            });

            let settings = DaemonSettings {
                network_config_dir: temp_dir.path().join("network"),
                timesync_config_file: temp_dir.path().join("timesync.conf"),
                network_seed_file: temp_dir.path().join("seed.json"),
                boot_apply_timeout_secs: 1,
                poll_interval_ms: 10,
                boot_units: vec!["incus.socket".to_string()],
                ..Default::default()
            };

            let caps = Capabilities {
                commands: host.clone(),
                services: host.clone(),
                hostname: host.clone(),
                environment: host.clone(),
                links: host.clone(),
                seed: host.clone(),
            };
            let applier = NetworkApplier::new(caps, settings.applier_settings());
            let state = Arc::new(NetworkState::new(Arc::new(applier)));

            Self {
                temp_dir,
                host,
                state,
                settings,
            }
        }

        fn seed(&self, content: &str) {
            fs::write(&self.settings.network_seed_file, content).unwrap();
        }

        async fn boot(&self, cancel: &Cancellation) -> anyhow::Result<()> {
            ServeCommand::new(self.settings.clone(), Arc::clone(&self.state))
                .boot(cancel)
                .await
        }
    }

    #[tokio::test]
    async fn test_boot_applies_seed_then_starts_units() {
        let daemon = Daemon::new(&["uplink"]);
        daemon.seed(UPLINK);

        daemon.boot(&Cancellation::never()).await.unwrap();

        let active = daemon.state.active().await.unwrap();
        assert_eq!(active.interfaces[0].name, "uplink");
        assert_eq!(*daemon.host.hostnames.lock().unwrap(), vec!["node1"]);
        assert!(daemon.temp_dir.path().join("network/20-uplink.network").exists());
        assert_eq!(
            *daemon.host.enabled.lock().unwrap(),
            vec![(vec!["incus.socket".to_string()], true)]
        );
    }

    #[tokio::test]
    async fn test_boot_without_seed_only_starts_units() {
        let daemon = Daemon::new(&[]);

        daemon.boot(&Cancellation::never()).await.unwrap();

        assert!(daemon.state.active().await.is_none());
        assert!(daemon.host.hostnames.lock().unwrap().is_empty());
        assert_eq!(daemon.host.enabled.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_boot_requires_every_seeded_device() {
        let daemon = Daemon::new(&["uplink"]);
        daemon.seed(
            r#"{"interfaces": [
                {"name": "uplink", "hwaddr": "aa:bb:cc:dd:ee:01", "addresses": ["dhcp4"]},
                {"name": "storage", "hwaddr": "aa:bb:cc:dd:ee:02", "addresses": ["dhcp4"]}
            ]}"#,
        );

        let err = daemon.boot(&Cancellation::never()).await.unwrap_err();

        assert!(format!("{:#}", err).contains("storage"));
        assert!(daemon.state.active().await.is_none());
        assert!(daemon.host.enabled.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_boot_with_invalid_seed() {
        let daemon = Daemon::new(&["uplink"]);
        daemon.seed("{not json");

        assert!(daemon.boot(&Cancellation::never()).await.is_err());
        assert!(daemon.host.enabled.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_boot() {
        let daemon = Daemon::new(&[]);
        daemon.seed(UPLINK);

        let (handle, cancel) = cancellation();
        handle.cancel();

        assert!(daemon.boot(&cancel).await.is_err());
        assert!(daemon.state.active().await.is_none());
    }

    #[tokio::test]
    async fn test_live_update_after_seeded_boot() {
        let mut daemon = Daemon::new(&["uplink"]);
        daemon.seed(UPLINK);

        // Seed presence is sampled when the daemon starts, as in `serve`
        let caps = Capabilities {
            commands: daemon.host.clone(),
            services: daemon.host.clone(),
            hostname: daemon.host.clone(),
            environment: daemon.host.clone(),
            links: daemon.host.clone(),
            seed: Arc::new(SeedFileProbe::new(&daemon.settings.network_seed_file)),
        };
        let applier = NetworkApplier::new(caps, daemon.settings.applier_settings());
        daemon.state = Arc::new(NetworkState::new(Arc::new(applier)));

        daemon.boot(&Cancellation::never()).await.unwrap();

        let update = read_config_str(
            r#"{"interfaces": [
                {"name": "uplink", "hwaddr": "aa:bb:cc:dd:ee:01", "addresses": ["dhcp4"]},
                {"name": "storage", "hwaddr": "aa:bb:cc:dd:ee:02", "addresses": ["dhcp4"]}
            ]}"#,
        );
        daemon
            .state
            .replace(update, Duration::from_millis(300), &Cancellation::never())
            .await
            .unwrap();

        assert_eq!(daemon.state.active().await.unwrap().interfaces.len(), 2);
    }

    fn read_config_str(content: &str) -> osd_network_core::NetworkConfig {
        serde_json::from_str(content).unwrap()
    }
}
