use serde::{Deserialize, Serialize};

use super::scope::{DirectoryId, ModuleId, RepositoryId};

/// Directory node as returned by `GET directorios/` and `POST directorios/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub id: DirectoryId,
    #[serde(rename = "nombre", default)]
    pub name: String,
    #[serde(default)]
    pub parent: Option<DirectoryId>,
}

/// Body of `POST directorios/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDirectoryRequest {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "repositorio")]
    pub repository: RepositoryId,
    #[serde(rename = "modulo")]
    pub module: Option<ModuleId>,
    pub parent: Option<DirectoryId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_uses_backend_field_names() {
        let body = serde_json::to_value(CreateDirectoryRequest {
            name: "Ads".to_string(),
            repository: 1,
            module: Some(2),
            parent: None,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"nombre": "Ads", "repositorio": 1, "modulo": 2, "parent": null})
        );
    }
}
