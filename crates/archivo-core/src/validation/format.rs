use serde::Serialize;

use crate::models::{IntakeEntry, ModuleDescriptor};

/// Verdict for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatCheck {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl FormatCheck {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatRejection {
    pub name: String,
    pub reason: String,
}

/// A batch split into files that may proceed and files that may not.
#[derive(Debug, Default)]
pub struct FormatPartition {
    pub accepted: Vec<IntakeEntry>,
    pub rejected: Vec<FormatRejection>,
}

impl FormatPartition {
    /// One aggregated, user-facing message for every rejected file.
    pub fn rejection_message(&self) -> Option<String> {
        aggregate_rejections(&self.rejected)
    }
}

/// `The following files are not allowed ...` followed by one bullet per file.
pub fn aggregate_rejections(rejected: &[FormatRejection]) -> Option<String> {
    if rejected.is_empty() {
        return None;
    }
    let lines = rejected
        .iter()
        .map(|r| format!("• {}\n  {}", r.name, r.reason))
        .collect::<Vec<_>>()
        .join("\n\n");
    Some(format!(
        "The following files are not allowed for the selected module:\n\n{}",
        lines
    ))
}

/// Allow-list check against the active module's formats.
///
/// A missing module or an empty allow-list accepts everything. Otherwise the
/// lowercased file name must end with one of the listed suffixes.
#[derive(Debug, Clone, Default)]
pub struct FormatValidator {
    module_name: String,
    allowed_formats: Vec<String>,
}

impl FormatValidator {
    pub fn new(module: Option<&ModuleDescriptor>) -> Self {
        match module {
            Some(module) => Self {
                module_name: module.name.clone(),
                allowed_formats: module
                    .allowed_formats
                    .iter()
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .collect(),
            },
            None => Self::default(),
        }
    }

    pub fn is_restricted(&self) -> bool {
        !self.allowed_formats.is_empty()
    }

    pub fn check(&self, file_name: &str) -> FormatCheck {
        if !self.is_restricted() {
            return FormatCheck::allowed();
        }

        let lowered = file_name.to_lowercase();
        let allowed = self
            .allowed_formats
            .iter()
            .any(|format| lowered.ends_with(&format.to_lowercase()));

        if allowed {
            FormatCheck::allowed()
        } else {
            tracing::debug!(file = %file_name, module = %self.module_name, "File format not allowed");
            FormatCheck {
                allowed: false,
                reason: Some(format!(
                    "Module {} only accepts: {}",
                    self.module_name,
                    self.allowed_formats.join(", ")
                )),
            }
        }
    }

    pub fn partition(&self, entries: Vec<IntakeEntry>) -> FormatPartition {
        let mut partition = FormatPartition::default();
        for entry in entries {
            let check = self.check(&entry.file.name);
            if check.allowed {
                partition.accepted.push(entry);
            } else {
                partition.rejected.push(FormatRejection {
                    name: entry.file.name.clone(),
                    reason: check.reason.unwrap_or_default(),
                });
            }
        }
        partition
    }
}
