//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! portal endpoints, the device type reported at login, the logout policy
//! flag, and the last account used (for login-form prefill).
//!
//! Configuration is stored at `~/.config/smartportal/config.json`. The same
//! directory holds the install-identity file used for reinstall detection.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config directory paths
const APP_NAME: &str = "smartportal";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Install-identity file name
const INSTALL_FILE: &str = "install_id";

/// Remote portal endpoints.
///
/// Defaults point at the production portal; staging builds and tests
/// override them wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    pub login_url: String,
    pub dashboard_url: String,
    pub logout_url: String,
    pub recovery_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login_url: "https://app.reaisystems.com.br/usuario/loginSmart".to_string(),
            dashboard_url: "https://app.reaisystems.com.br/inicio/dashboard?origem=login"
                .to_string(),
            logout_url: "https://app.reaisystems.com.br/usuario/logout".to_string(),
            recovery_url: "https://app.smartimobiliario.com.br/sistema/recuperarSenha".to_string(),
        }
    }
}

/// Device type reported to the login endpoint as `tipoDispositivo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Iphone,
    Android,
}

impl DeviceKind {
    /// Wire value expected by the portal.
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Iphone => "iphone",
            DeviceKind::Android => "android",
        }
    }
}

impl Default for DeviceKind {
    fn default() -> Self {
        if cfg!(target_os = "ios") {
            DeviceKind::Iphone
        } else {
            DeviceKind::Android
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub device: DeviceKind,
    /// Whether logout also drops the biometric-enabled flag.
    /// Off by default: logging out forgets the account, not the user's
    /// preference for biometric protection.
    #[serde(default)]
    pub clear_biometric_on_logout: bool,
    /// Last account that signed in, used to prefill the login form.
    #[serde(default)]
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME))
    }
}

/// File-backed identity of the current installation.
///
/// The identity file lives in the config directory, which the OS removes on
/// uninstall. The keychain may survive an uninstall, so a fresh identity
/// paired with leftover keychain credentials is the reinstall signal the
/// session controller purges on.
pub struct InstallIdentity;

impl InstallIdentity {
    /// Return the identity for this installation, generating and persisting
    /// a new one on first run.
    pub fn load_or_create(dir: &Path) -> Result<String> {
        let path = dir.join(INSTALL_FILE);
        if path.exists() {
            let id = fs::read_to_string(&path)?.trim().to_string();
            if !id.is_empty() {
                return Ok(id);
            }
        }
        let id = Self::generate();
        fs::create_dir_all(dir)?;
        fs::write(&path, &id)?;
        Ok(id)
    }

    fn generate() -> String {
        format!("{:032x}", rand::random::<u128>())
    }
}
