//! Validation modules

pub mod format;

pub use format::{
    aggregate_rejections, FormatCheck, FormatPartition, FormatRejection, FormatValidator,
};
