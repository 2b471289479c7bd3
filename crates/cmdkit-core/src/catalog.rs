use serde::Deserialize;

use crate::{CommandsetDefinition, CommandsetError, Result};

const BUILTIN_CATALOG: &str = include_str!("../catalog/builtin.toml");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    commandsets: Vec<CommandsetDefinition>,
}

pub(crate) fn builtin_catalog() -> &'static str {
    BUILTIN_CATALOG
}

pub(crate) fn parse_catalog(input: &str) -> Result<Vec<CommandsetDefinition>> {
    let catalog: CatalogFile = toml::from_str(input)
        .map_err(|err| CommandsetError::serialization("failed to parse commandset catalog", err))?;
    Ok(catalog.commandsets)
}
