use serde::{Deserialize, Serialize};

use crate::naming::{path_basename, path_extension};

/// A server-known asset as returned by the list endpoints of any resource family.
///
/// Only the naming fields matter to the upload engine; everything else in the
/// record is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetRecord {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default, alias = "nombre")]
    pub nombre_original: Option<String>,
    #[serde(default)]
    pub archivo_original: Option<String>,
}

impl AssetRecord {
    /// Filename (with extension) this record occupies.
    ///
    /// The display name is stored extension-stripped (and may contain dots of
    /// its own), so the extension always comes from the stored file path
    /// unless the display name already ends with it.
    pub fn file_name(&self) -> Option<String> {
        let display = self
            .nombre_original
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let stored = self
            .archivo_original
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());

        match (display, stored) {
            (Some(name), Some(path)) => match path_extension(path) {
                Some(ext) if !has_extension(name, ext) => Some(format!("{}.{}", name, ext)),
                _ => Some(name.to_string()),
            },
            (Some(name), None) => Some(name.to_string()),
            (None, Some(path)) => {
                let base = path_basename(path);
                (!base.is_empty()).then(|| base.to_string())
            }
            (None, None) => None,
        }
    }
}

fn has_extension(name: &str, ext: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, current)| current.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: Option<&str>, path: Option<&str>) -> AssetRecord {
        AssetRecord {
            id: None,
            nombre_original: name.map(String::from),
            archivo_original: path.map(String::from),
        }
    }

    #[test]
    fn display_name_already_carrying_extension_is_kept() {
        let r = record(Some("Spot.MP4"), Some("/media/originals/spot_x1.mp4"));
        assert_eq!(r.file_name().as_deref(), Some("Spot.MP4"));
        let r = record(Some("Spot.MP4"), None);
        assert_eq!(r.file_name().as_deref(), Some("Spot.MP4"));
    }

    #[test]
    fn dotted_base_name_gets_extension_from_path() {
        let r = record(Some("a.b.c"), Some("/media/originals/a.b.c.MP4"));
        assert_eq!(r.file_name().as_deref(), Some("a.b.c.MP4"));
        let r = record(Some("v1.2 final"), Some("/media/originals/v1.2_final.mov"));
        assert_eq!(r.file_name().as_deref(), Some("v1.2 final.mov"));
    }

    #[test]
    fn extension_recovered_from_stored_path() {
        let r = record(Some("spot1"), Some("/media/originals/spot1_a8f.mov"));
        assert_eq!(r.file_name().as_deref(), Some("spot1.mov"));
    }

    #[test]
    fn falls_back_to_path_basename() {
        let r = record(None, Some("http://localhost:8000/media/originals/clip.mp4"));
        assert_eq!(r.file_name().as_deref(), Some("clip.mp4"));
        let r = record(Some("   "), Some("originals/clip.mp4"));
        assert_eq!(r.file_name().as_deref(), Some("clip.mp4"));
    }

    #[test]
    fn nothing_to_derive() {
        assert_eq!(record(None, None).file_name(), None);
        assert_eq!(record(Some("bare"), None).file_name().as_deref(), Some("bare"));
    }

    #[test]
    fn deserializes_partial_records() {
        let json = r#"[{"id": "1f0c", "nombre_original": "spot", "archivo_original": "/media/o/spot.mov", "estado_transcodificacion": "COMPLETADO"}, {"id": 7}]"#;
        let records: Vec<AssetRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].file_name().as_deref(), Some("spot.mov"));
        assert_eq!(records[1].file_name(), None);
    }
}
