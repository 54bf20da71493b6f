//! Tests for installing artifacts on disk

use tempfile::TempDir;

use osd_network_core::{InterfaceConfig, NetworkConfig, NetworkError, NtpConfig, SystemError};

use super::mac;
use crate::{ArtifactWriter, NetworkdGenerator};

fn config_with_ntp(timeservers: &[&str]) -> NetworkConfig {
    NetworkConfig {
        interfaces: vec![InterfaceConfig::new("uplink", mac("aa:bb:cc:dd:ee:01")).with_address("dhcp4")],
        ntp: Some(NtpConfig {
            timeservers: timeservers.iter().map(|s| s.to_string()).collect(),
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_write_replaces_directory() {
    let temp_dir = TempDir::new().unwrap();
    let network_dir = temp_dir.path().join("network");
    let timesync_file = temp_dir.path().join("timesyncd.conf.d").join("osd-network.conf");

    std::fs::create_dir_all(&network_dir).unwrap();
    std::fs::write(network_dir.join("99-stale.network"), "[Match]\n").unwrap();

    let writer = ArtifactWriter::new(&network_dir, &timesync_file);
    let artifacts = NetworkdGenerator::new().generate(&config_with_ntp(&["pool.ntp.org"]));
    writer.write(&artifacts).await.unwrap();

    assert!(!network_dir.join("99-stale.network").exists());

    let mut written: Vec<String> = std::fs::read_dir(&network_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, artifacts.sorted_names());

    for artifact in artifacts.iter() {
        let on_disk = std::fs::read_to_string(network_dir.join(&artifact.name)).unwrap();
        assert_eq!(on_disk, artifact.contents);
    }

    assert_eq!(
        std::fs::read_to_string(&timesync_file).unwrap(),
        "[Time]\nFallbackNTP=pool.ntp.org\n"
    );
}

#[tokio::test]
async fn test_clearing_ntp_removes_timesync_file() {
    let temp_dir = TempDir::new().unwrap();
    let timesync_file = temp_dir.path().join("timesync.conf");
    let writer = ArtifactWriter::new(temp_dir.path().join("network"), &timesync_file);
    let generator = NetworkdGenerator::new();

    writer
        .write(&generator.generate(&config_with_ntp(&["ntp.example.org"])))
        .await
        .unwrap();
    assert!(timesync_file.exists());

    writer
        .write(&generator.generate(&config_with_ntp(&[])))
        .await
        .unwrap();
    assert!(!timesync_file.exists());

    // Nothing to remove the second time around
    writer
        .write(&generator.generate(&config_with_ntp(&[])))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_write_failure_reports_path() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();

    let network_dir = blocker.join("network");
    let writer = ArtifactWriter::new(&network_dir, temp_dir.path().join("timesync.conf"));
    let artifacts = NetworkdGenerator::new().generate(&config_with_ntp(&[]));

    match writer.write(&artifacts).await {
        Err(NetworkError::System(SystemError::ConfigWrite { path, .. })) => {
            assert_eq!(path, network_dir);
        }
        other => panic!("expected ConfigWrite error, got {:?}", other),
    }
}
