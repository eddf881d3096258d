use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tcucore::params::TcuParameters;
use tcucore::Endianness;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub address: String,
    pub bof: String,
    pub login_timeout_s: u64,
    /// Overrides the header's `CLOCK_PERIOD_NS` when set.
    pub clock_period_ns: Option<u32>,
    pub endianness: Endianness,
    pub arm: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            address: "192.168.1.36".into(),
            bof: "tcu_v2.bof".into(),
            login_timeout_s: 30,
            clock_period_ns: None,
            endianness: Endianness::Big,
            arm: true,
        }
    }
}

impl ControllerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading controller config {}", path_ref.display()))?;
        let config: ControllerConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing controller config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Applies command-line values on top of the loaded config.
    pub fn with_overrides(
        mut self,
        clock_period_ns: Option<u32>,
        endianness: Option<Endianness>,
    ) -> Self {
        if clock_period_ns.is_some() {
            self.clock_period_ns = clock_period_ns;
        }
        if let Some(endianness) = endianness {
            self.endianness = endianness;
        }
        self
    }

    pub fn clock_period_ns_for(&self, params: &TcuParameters) -> u32 {
        self.clock_period_ns.unwrap_or(params.clock_period_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_rhino_setup() {
        let cfg = ControllerConfig::default();
        assert_eq!(cfg.bof, "tcu_v2.bof");
        assert_eq!(cfg.login_timeout_s, 30);
        assert!(cfg.arm);
    }

    #[test]
    fn config_load_reads_yaml_with_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"address: 10.0.0.2\nendianness: little\nclock_period_ns: 5\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = ControllerConfig::load(&path).unwrap();
        assert_eq!(cfg.address, "10.0.0.2");
        assert_eq!(cfg.endianness, Endianness::Little);
        assert_eq!(cfg.clock_period_ns, Some(5));
        assert_eq!(cfg.bof, "tcu_v2.bof");
    }

    #[test]
    fn overrides_replace_only_given_values() {
        let cfg = ControllerConfig {
            clock_period_ns: Some(5),
            ..Default::default()
        }
        .with_overrides(None, Some(Endianness::Little));
        assert_eq!(cfg.clock_period_ns, Some(5));
        assert_eq!(cfg.endianness, Endianness::Little);
    }

    #[test]
    fn header_clock_is_used_without_override() {
        let params = TcuParameters {
            clock_period_ns: 8,
            ..Default::default()
        };
        assert_eq!(ControllerConfig::default().clock_period_ns_for(&params), 8);
        let cfg = ControllerConfig::default().with_overrides(Some(10), None);
        assert_eq!(cfg.clock_period_ns_for(&params), 10);
    }
}
