use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::target::normalize_target;

/// Environment variable holding the upstream used before any runtime change
pub const TARGET_ENV_VAR: &str = "CHAT_RELAY_TARGET";

/// Environment variable holding the token for auth-gated backend models
pub const HF_TOKEN_ENV_VAR: &str = "HF_TOKEN";

/// chat-relay configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default)]
    pub allow_lan_access: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allow_lan_access: false,
        }
    }
}

impl ServerConfig {
    pub fn bind_host(&self) -> &str {
        if self.allow_lan_access {
            "0.0.0.0"
        } else {
            &self.host
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Inbound path prefix that gets stripped and forwarded
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Side-channel path accepting `{"target": ...}`
    #[serde(default = "default_control_path")]
    pub control_path: String,

    #[serde(default = "default_target")]
    pub default_target: String,

    /// Connect timeout in seconds; unset keeps the transport default
    #[serde(default)]
    pub connect_timeout: Option<u64>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            control_path: default_control_path(),
            default_target: default_target(),
            connect_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    /// Serve the browser client from this directory instead of the embedded page
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Where the terminal client reaches the proxy
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,

    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy_url: default_proxy_url(),
            state_file: default_state_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_host")]
    pub host: String,

    #[serde(default = "default_backend_port")]
    pub port: u16,

    #[serde(default)]
    pub hf_token: Option<String>,

    #[serde(default = "default_backend_models")]
    pub models: Vec<BackendModel>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: default_backend_host(),
            port: default_backend_port(),
            hf_token: None,
            models: default_backend_models(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendModel {
    /// Identifier exposed in `available_models`
    pub id: String,

    /// Upstream repository name
    pub name: String,

    #[serde(default)]
    pub requires_auth: bool,
}

impl Config {
    /// Upstream the target store starts with.
    /// The environment wins over the config file; either way the result carries a scheme.
    pub fn initial_target(&self) -> String {
        self.initial_target_from(std::env::var(TARGET_ENV_VAR).ok())
    }

    pub fn initial_target_from(&self, env_value: Option<String>) -> String {
        let raw = env_value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.proxy.default_target.clone());
        normalize_target(&raw)
    }

    /// Token for auth-gated backend models, config first then `HF_TOKEN`
    pub fn hf_token(&self) -> Option<String> {
        self.backend
            .hf_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(HF_TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let prefix = &self.proxy.prefix;
        if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
            anyhow::bail!("proxy.prefix must look like \"/api\", got {:?}", prefix);
        }

        let control = &self.proxy.control_path;
        if !control.starts_with('/') {
            anyhow::bail!("proxy.control_path must start with '/', got {:?}", control);
        }
        if control == prefix || control.starts_with(&format!("{}/", prefix)) {
            anyhow::bail!(
                "proxy.control_path {:?} would be swallowed by proxy.prefix {:?}",
                control,
                prefix
            );
        }
        Ok(())
    }
}

// Default value functions
fn default_port() -> u16 { 5173 }
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_prefix() -> String { "/api".to_string() }
fn default_control_path() -> String { "/__proxy/target".to_string() }
fn default_target() -> String { "http://localhost:8000".to_string() }
fn default_proxy_url() -> String { "http://127.0.0.1:5173".to_string() }
fn default_backend_host() -> String { "0.0.0.0".to_string() }
fn default_backend_port() -> u16 { 8000 }

fn default_backend_models() -> Vec<BackendModel> {
    vec![
        BackendModel {
            id: "dobby-8b".to_string(),
            name: "SentientAGI/Dobby-Mini-Unhinged-Llama-3.1-8B".to_string(),
            requires_auth: false,
        },
        BackendModel {
            id: "llama3.1-8b".to_string(),
            name: "meta-llama/Llama-3.1-8B-Instruct".to_string(),
            requires_auth: true,
        },
    ]
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("chat-relay")
}

fn default_state_file() -> PathBuf {
    config_dir().join("client.json")
}

/// Get default config file path
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load config from file, or return defaults if not found.
///
/// Loading order:
/// 1. Specified path (if provided)
/// 2. ./config.toml (if exists)
/// 3. default_config_path() (usually ~/.config/chat-relay/config.toml)
pub fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let config = read_config(path)?;
    config.validate()?;
    Ok(config)
}

fn read_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    if let Some(config_path) = path {
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::info!("Loaded config from specified path {:?}", config_path);
            return Ok(config);
        } else {
            anyhow::bail!("Specified config file not found: {:?}", config_path);
        }
    }

    let local_config = PathBuf::from("config.toml");
    if local_config.exists() {
        match std::fs::read_to_string(&local_config) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from current directory {:?}", local_config);
                    return Ok(config);
                }
                Err(e) => {
                    tracing::error!("Failed to parse ./config.toml: {}. Falling back to default path.", e);
                }
            },
            Err(e) => {
                tracing::error!("Failed to read ./config.toml: {}. Falling back to default path.", e);
            }
        }
    }

    let default_path = default_config_path();
    if default_path.exists() {
        let content = std::fs::read_to_string(&default_path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::info!("Loaded config from default path {:?}", default_path);
        Ok(config)
    } else {
        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }
}

/// The file `load_config` reads for `explicit`, or `None` when defaults apply
pub fn config_source(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    [PathBuf::from("config.toml"), default_config_path()]
        .into_iter()
        .find(|p| p.exists())
}

/// Expand ~ in path to home directory
pub fn expand_path(path: &PathBuf) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(rest) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
    }
    path.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 5173);
        assert_eq!(config.proxy.prefix, "/api");
        assert_eq!(config.proxy.control_path, "/__proxy/target");
        assert_eq!(config.backend.port, 8000);
        assert_eq!(config.backend.models.len(), 2);
        assert!(config.ui.directory.is_none());
    }

    #[test]
    fn loads_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 9100\n\n[proxy]\ndefault_target = \"upstream.local:8000\"\n\n[[backend.models]]\nid = \"tiny\"\nname = \"org/tiny\""
        )
        .unwrap();

        let config = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.proxy.default_target, "upstream.local:8000");
        assert_eq!(config.backend.models.len(), 1);
        assert!(!config.backend.models[0].requires_auth);
    }

    #[test]
    fn explicit_path_is_the_reported_source() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let explicit = file.path().to_path_buf();
        assert_eq!(config_source(Some(explicit.clone())), Some(explicit));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(dir.path().join("nope.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn initial_target_prefers_environment_and_normalizes() {
        let mut config = Config::default();
        config.proxy.default_target = "from-file:8000".to_string();

        assert_eq!(config.initial_target_from(None), "http://from-file:8000");
        assert_eq!(
            config.initial_target_from(Some("https://from-env".to_string())),
            "https://from-env"
        );
        assert_eq!(
            config.initial_target_from(Some("   ".to_string())),
            "http://from-file:8000"
        );
    }

    #[test]
    fn rejects_control_path_under_prefix() {
        let mut config = Config::default();
        config.proxy.control_path = "/api/target".to_string();
        assert!(config.validate().is_err());

        config.proxy.control_path = "/apitarget".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_malformed_prefix() {
        let mut config = Config::default();
        for bad in ["api", "/", "/api/"] {
            config.proxy.prefix = bad.to_string();
            assert!(config.validate().is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn lan_access_binds_all_interfaces() {
        let mut server = ServerConfig::default();
        assert_eq!(server.bind_host(), "127.0.0.1");
        server.allow_lan_access = true;
        assert_eq!(server.bind_host(), "0.0.0.0");
    }
}
