mod catalog;
mod definition;
mod error;
mod registry;
mod storage;
mod version;

pub use definition::{CommandsetCategory, CommandsetDefinition, DeclaredFile, FileCategory};
pub use error::{CommandsetError, IoResultExt, Result};
pub use registry::{CommandsetRegistry, AUXILIARY_COMMANDSET, PRIMARY_WORKFLOW};
pub use storage::{FsStorage, MemoryStorage, Storage};
pub use version::{is_newer_version, is_valid_version, parse_version};

#[cfg(test)]
mod tests;
