use serde::{Deserialize, Serialize};
use ssz_derive::Ssz;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Process-wide configuration, loaded once at startup and immutable thereafter.
/// Lives inside `State` and is part of its SSZ hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Ssz, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub num_validators: u64,
    pub genesis_time: u64,
}

impl Config {
    pub fn new(num_validators: u64, genesis_time: u64) -> Self {
        Self {
            num_validators,
            genesis_time,
        }
    }
}

/// Richer, file-loadable genesis manifest used by node bootstrap code. This is
/// ambient configuration plumbing around the core `Config`, not part of the
/// state transition function itself: it additionally carries the validator
/// public keys needed to build a genesis `State`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenesisConfig {
    pub genesis_time: u64,
    pub num_validators: u64,
    /// Hex-encoded (optionally `0x`-prefixed) 52-byte validator public keys.
    /// If shorter than `num_validators`, the remainder are zero-filled.
    pub validator_pubkeys: Vec<String>,
}

impl GenesisConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }

    pub fn to_config(&self) -> Config {
        Config::new(self.num_validators, self.genesis_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrips_through_json() {
        let config = Config::new(4, 1_700_000_000);
        let json = serde_json::to_string(&config).unwrap();
        let decoded: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, decoded);
    }

    #[test]
    fn genesis_config_defaults_to_empty_validator_set() {
        let config = GenesisConfig::default();
        assert_eq!(config.num_validators, 0);
        assert!(config.validator_pubkeys.is_empty());
    }
}
