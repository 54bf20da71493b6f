//! Minimal writer for systemd unit-file syntax

use std::fmt;

/// One `[Section]` with its `Key=Value` entries in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    /// Append an entry. Keys may repeat.
    pub fn set(&mut self, key: &str, value: impl fmt::Display) -> &mut Self {
        self.entries.push((key.to_string(), value.to_string()));
        self
    }

    /// Append an entry only when a value is present.
    pub fn set_opt<T: fmt::Display>(&mut self, key: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.set(key, value);
        }
        self
    }
}

/// A unit file assembled section by section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitFile {
    sections: Vec<Section>,
}

impl UnitFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new section and return it for filling.
    pub fn section(&mut self, name: &str) -> &mut Section {
        self.sections.push(Section {
            name: name.to_string(),
            entries: Vec::new(),
        });
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    /// Render to text; sections are separated by a blank line.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for UnitFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in &section.entries {
                writeln!(f, "{}={}", key, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let mut unit = UnitFile::new();
        unit.section("Match").set("Name", "uplink");
        unit.section("Link")
            .set("NamePolicy", "")
            .set_opt("MTUBytes", None::<u32>)
            .set_opt("MTUBytes", Some(1500));

        assert_eq!(
            unit.render(),
            "[Match]\nName=uplink\n\n[Link]\nNamePolicy=\nMTUBytes=1500\n"
        );
    }

    #[test]
    fn test_repeated_keys_keep_order() {
        let mut unit = UnitFile::new();
        unit.section("Network").set("DNS", "192.0.2.1").set("DNS", "192.0.2.2");

        assert_eq!(unit.render(), "[Network]\nDNS=192.0.2.1\nDNS=192.0.2.2\n");
    }
}
