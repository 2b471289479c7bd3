use std::io;
use std::path::{Component, Path};

use sha2::{Digest, Sha256};

use crate::FileFailureKind;

/// Forward-slash form used for every path reported to callers.
pub(crate) fn relative_display(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn write_failure_kind(err: &io::Error) -> FileFailureKind {
    match err.kind() {
        io::ErrorKind::PermissionDenied => FileFailureKind::PermissionDenied,
        _ => FileFailureKind::WriteFailed(err.to_string()),
    }
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
