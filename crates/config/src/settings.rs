// Application configuration
// Loaded from ~/.config/planilla/config.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use planilla_core::{DescriptorError, GridDescriptor};

use crate::grids::{builtin_grids, GridConfig};
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FichaConfig {
    /// Image shown when no photo is known
    pub placeholder: String,

    /// Listing and default persistence endpoint
    #[serde(rename = "apiEmpleados")]
    pub api_empleados: String,

    /// Single-record endpoint; the identifier is appended
    #[serde(rename = "apiEmpleadoBase")]
    pub api_empleado_base: String,

    /// Photo resolution endpoint; the identifier is appended
    #[serde(rename = "apiFotoBase")]
    pub api_foto_base: String,

    #[serde(rename = "baseUrl")]
    pub base_url: String,

    /// Prefix for `{foto: filename}` lookup results
    #[serde(rename = "fotoStaticBase")]
    pub foto_static_base: String,

    #[serde(rename = "uploadPath")]
    pub upload_path: String,

    #[serde(rename = "removePath")]
    pub remove_path: String,

    #[serde(rename = "loginPath")]
    pub login_path: String,

    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: u64,

    pub grids: Vec<GridConfig>,
}

impl Default for FichaConfig {
    fn default() -> Self {
        Self {
            placeholder: "/static/imagenes/default.png".to_string(),
            api_empleados: "/api/empleados".to_string(),
            api_empleado_base: "/api/empleado/".to_string(),
            api_foto_base: "/api/foto/".to_string(),
            base_url: "http://127.0.0.1:5000".to_string(),
            foto_static_base: "/static/fotos/".to_string(),
            upload_path: "/subir_foto".to_string(),
            remove_path: "/eliminar_foto".to_string(),
            login_path: "/login".to_string(),
            timeout_secs: 30,
            grids: builtin_grids(),
        }
    }
}

impl FichaConfig {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("planilla");
        config_dir.join("config.json")
    }

    /// Load from the default location. A missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse config text. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(serde_json::from_str(&cleaned)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Grid descriptors in declaration order.
    pub fn descriptors(&self) -> Result<Vec<GridDescriptor>, DescriptorError> {
        self.grids
            .iter()
            .map(|g| g.to_descriptor(&self.api_empleados))
            .collect()
    }

    pub fn grid(&self, id: &str) -> Option<&GridConfig> {
        self.grids.iter().find(|g| g.id == id)
    }
}
