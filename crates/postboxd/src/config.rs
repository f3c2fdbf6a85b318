use anyhow::{Context, Result};
use postbox_crypto::{keccak256, KeyPair};
use postbox_inbox::InboxConfig;
use postbox_protocol::Overlay;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub account: AccountConfig,
    #[serde(default)]
    pub inbox: InboxConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(skip)]
    config_file_path: PathBuf,
    #[serde(skip)]
    pub data_directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Name the inbox is published under
    pub name: String,
    #[serde(with = "hex_bytes")]
    pub public_key: Vec<u8>,
    /// Neighborhood to mine the inbox for
    pub overlay: Overlay,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Shared root holding the chunk store and the name directory
    pub root: PathBuf,
}

impl StorageConfig {
    pub fn chunks_dir(&self) -> PathBuf {
        self.root.join("chunks")
    }

    pub fn directory_file(&self) -> PathBuf {
        self.root.join("directory.json")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 20 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let config_path = config_path.unwrap_or_else(Self::default_config_path);
        let data_dir = data_dir.unwrap_or_else(Self::default_data_dir);

        if !config_path.exists() {
            anyhow::bail!(
                "Configuration file not found: {}\nRun `postboxd init` to create a new configuration",
                config_path.display()
            );
        }

        let contents =
            fs::read_to_string(&config_path).context("Failed to read configuration file")?;

        let mut config: Config =
            serde_yaml::from_str(&contents).context("Failed to parse configuration file")?;

        config.config_file_path = config_path;
        config.data_directory = data_dir;

        Ok(config)
    }

    /// Create a new default configuration and account key
    pub fn create_default(
        config_path: Option<PathBuf>,
        data_dir: Option<PathBuf>,
        name: &str,
        storage_root: Option<PathBuf>,
    ) -> Result<Self> {
        let config_path = config_path.unwrap_or_else(Self::default_config_path);
        let data_dir = data_dir.unwrap_or_else(Self::default_data_dir);

        if config_path.exists() {
            anyhow::bail!(
                "Configuration already exists: {}",
                config_path.display()
            );
        }

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&data_dir)?;

        // Generate account key
        let account = KeyPair::generate();

        let key_dir = data_dir.join("keys");
        fs::create_dir_all(&key_dir)?;
        fs::write(key_dir.join("account.key"), account.export_secret_hex())?;
        fs::write(key_dir.join("account.pub"), account.export_public_hex())?;

        let config = Config {
            account: AccountConfig {
                name: name.to_string(),
                public_key: account.public_key_bytes().to_vec(),
                overlay: Overlay::from_bytes(keccak256(&account.public_key_bytes())),
            },
            inbox: InboxConfig::default(),
            storage: StorageConfig {
                root: storage_root.unwrap_or_else(|| data_dir.join("network")),
            },
            poll: PollConfig::default(),
            logging: LoggingConfig::default(),
            config_file_path: config_path.clone(),
            data_directory: data_dir,
        };

        config.save()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(&self.config_file_path, yaml).context("Failed to write configuration file")?;
        Ok(())
    }

    /// Load the account key written by `create_default`
    pub fn load_account_key(&self) -> Result<KeyPair> {
        let path = self.keys_dir().join("account.key");
        let hex = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read account key {}", path.display()))?;
        let key = KeyPair::from_hex(hex.trim()).context("Invalid account key")?;

        if key.public_key_bytes().as_slice() != self.account.public_key.as_slice() {
            anyhow::bail!("Account key does not match configured public key");
        }
        Ok(key)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_file_path
    }

    pub fn keys_dir(&self) -> PathBuf {
        self.data_directory.join("keys")
    }

    /// Mined inbox parameters
    pub fn inbox_path(&self) -> PathBuf {
        self.data_directory.join("inbox.json")
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_directory.join("state.json")
    }

    pub fn received_dir(&self) -> PathBuf {
        self.data_directory.join("received")
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("postbox")
            .join("config.yaml")
    }

    fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("postbox")
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.yaml");
        let data_dir = tmp.path().join("data");

        let created = Config::create_default(
            Some(config_path.clone()),
            Some(data_dir.clone()),
            "alice",
            None,
        )
        .unwrap();
        assert!(data_dir.join("keys").join("account.key").exists());

        let loaded = Config::load(Some(config_path), Some(data_dir.clone())).unwrap();
        assert_eq!(loaded.account.name, "alice");
        assert_eq!(loaded.account.public_key, created.account.public_key);
        assert_eq!(loaded.inbox, InboxConfig::default());
        assert_eq!(loaded.storage.root, data_dir.join("network"));

        let key = loaded.load_account_key().unwrap();
        assert_eq!(key.public_key_bytes().to_vec(), loaded.account.public_key);
    }

    #[test]
    fn test_missing_config() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Config::load(Some(tmp.path().join("nope.yaml")), None).unwrap_err();
        assert!(err.to_string().contains("postboxd init"));
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.yaml");
        let data_dir = tmp.path().join("data");

        Config::create_default(Some(config_path.clone()), Some(data_dir.clone()), "a", None)
            .unwrap();
        assert!(
            Config::create_default(Some(config_path), Some(data_dir), "a", None).is_err()
        );
    }
}
