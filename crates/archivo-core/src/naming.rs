//! Filename rules: duplicate identity keys and display-name derivation.

use std::fmt;

/// Build the case-insensitive `base.extension` identity of a filename.
///
/// The last `.`-separated segment is the extension; everything before it,
/// dots included, is the base. Names without a dot are just lowercased.
pub fn build_key(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        None => file_name.to_lowercase(),
        Some((base, extension)) => format!("{}.{}", base.to_lowercase(), extension.to_lowercase()),
    }
}

/// Remove the trailing `.ext` from a filename.
///
/// Leading-dot names (`.hidden`), trailing-dot names (`clip.`) and names
/// without a dot are returned as-is, and path separators are never crossed.
pub fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) if idx + 1 == file_name.len() => file_name,
        Some(idx) if file_name[idx..].contains('/') => file_name,
        Some(idx) => &file_name[..idx],
    }
}

/// Extension of a stored file path (`media/originals/spot.mov` -> `mov`).
pub fn path_extension(path: &str) -> Option<&str> {
    let base = path_basename(path);
    match base.rfind('.') {
        Some(0) | None => None,
        Some(idx) if idx + 1 == base.len() => None,
        Some(idx) => Some(&base[idx + 1..]),
    }
}

/// Last segment of a `/`-separated path, ignoring any query string.
pub fn path_basename(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}

/// Normalized identity used for "already exists" checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DuplicateKey(String);

impl DuplicateKey {
    pub fn from_name(file_name: &str) -> Self {
        Self(build_key(file_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DuplicateKey> for String {
    fn from(key: DuplicateKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_key_is_case_insensitive() {
        assert_eq!(build_key("Foo.MOV"), "foo.mov");
        assert_eq!(build_key("foo.mov"), "foo.mov");
        assert_eq!(build_key("Foo.MOV"), build_key("foo.mov"));
    }

    #[test]
    fn build_key_without_extension() {
        assert_eq!(build_key("noext"), "noext");
        assert_eq!(build_key("NoExt"), "noext");
    }

    #[test]
    fn build_key_keeps_inner_dots_in_base() {
        assert_eq!(build_key("a.b.c.MP4"), "a.b.c.mp4");
    }

    #[test]
    fn duplicate_key_display() {
        let key = DuplicateKey::from_name("CLIP.MP4");
        assert_eq!(key.as_str(), "clip.mp4");
        assert_eq!(key.to_string(), "clip.mp4");
    }

    #[test]
    fn strip_extension_removes_last_segment_only() {
        assert_eq!(strip_extension("spot1.mp4"), "spot1");
        assert_eq!(strip_extension("a.b.c.mp4"), "a.b.c");
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension(".hidden"), ".hidden");
        assert_eq!(strip_extension("clip."), "clip.");
    }

    #[test]
    fn path_helpers() {
        assert_eq!(path_basename("/media/originals/spot.mov"), "spot.mov");
        assert_eq!(path_basename("http://host/media/spot.mov?x=1"), "spot.mov");
        assert_eq!(path_extension("media/originals/spot.MOV"), Some("MOV"));
        assert_eq!(path_extension("media/originals/spot"), None);
        assert_eq!(path_extension("media/.env"), None);
    }
}
