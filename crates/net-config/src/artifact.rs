//! Generated configuration artifacts

use indexmap::IndexMap;

/// Kind of systemd-networkd unit an artifact configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Link,
    Netdev,
    Network,
}

impl ArtifactKind {
    /// File suffix networkd expects for this kind
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Link => "link",
            ArtifactKind::Netdev => "netdev",
            ArtifactKind::Network => "network",
        }
    }
}

/// One named unit file.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// File name inside the configuration directory
    pub name: String,
    pub kind: ArtifactKind,
    pub contents: String,
}

impl Artifact {
    /// Build an artifact named `<stem>.<kind extension>`.
    pub fn new(stem: &str, kind: ArtifactKind, contents: String) -> Self {
        Self {
            name: format!("{}.{}", stem, kind.extension()),
            kind,
            contents,
        }
    }
}

/// Complete output of one generation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactSet {
    units: IndexMap<String, Artifact>,
    timesync: Option<String>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit artifact, replacing any previous one with the same name.
    pub fn push(&mut self, artifact: Artifact) {
        self.units.insert(artifact.name.clone(), artifact);
    }

    pub fn set_timesync(&mut self, contents: String) {
        self.timesync = Some(contents);
    }

    /// Time-sync drop-in, present only when time servers are configured.
    pub fn timesync(&self) -> Option<&str> {
        self.timesync.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.units.get(name)
    }

    /// Unit artifacts in generation order.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.units.values()
    }

    /// Unit file names in the order networkd will read them.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.units.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
