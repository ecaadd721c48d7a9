use serde::{Deserialize, Serialize};
use std::fmt;

use super::scope::ModuleId;

/// Typed content bucket. Selects the backend resource family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModuleType {
    Storage,
    Reel,
    #[default]
    Broadcast,
    Audio,
    Images,
    Other(String),
}

impl ModuleType {
    pub fn as_str(&self) -> &str {
        match self {
            ModuleType::Storage => "storage",
            ModuleType::Reel => "reel",
            ModuleType::Broadcast => "broadcast",
            ModuleType::Audio => "audio",
            ModuleType::Images => "images",
            ModuleType::Other(other) => other.as_str(),
        }
    }

    /// Resource path for list and upload calls.
    pub fn resource(&self) -> &'static str {
        match self {
            ModuleType::Audio => "audios/",
            ModuleType::Images => "images/",
            ModuleType::Storage => "storage/",
            _ => "broadcasts/",
        }
    }
}

impl From<String> for ModuleType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "storage" => ModuleType::Storage,
            "reel" => ModuleType::Reel,
            "broadcast" => ModuleType::Broadcast,
            "audio" => ModuleType::Audio,
            "images" => ModuleType::Images,
            _ => ModuleType::Other(value),
        }
    }
}

impl From<&str> for ModuleType {
    fn from(value: &str) -> Self {
        ModuleType::from(value.to_string())
    }
}

impl From<ModuleType> for String {
    fn from(value: ModuleType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Module as returned by `GET modulos/<id>/`. Read-only to the upload engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub id: ModuleId,
    #[serde(rename = "nombre", alias = "name", default)]
    pub name: String,
    #[serde(rename = "tipo", alias = "type", default)]
    pub module_type: ModuleType,
    #[serde(rename = "formatos_permitidos", default)]
    pub allowed_formats: Vec<String>,
}

impl ModuleDescriptor {
    pub fn is_restricted(&self) -> bool {
        self.allowed_formats.iter().any(|f| !f.trim().is_empty())
    }

    /// Accept filter offered to file pickers (`*` when unrestricted).
    pub fn accept_filter(&self) -> String {
        if !self.is_restricted() {
            return "*".to_string();
        }
        self.allowed_formats
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }
}
