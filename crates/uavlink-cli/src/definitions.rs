//! Loading object definitions from a directory of JSON files.
//!
//! Each `*.json` file holds either one definition or an array of them.
//! Files are read in name order so that diagnostics are stable.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};
use uavlink_objects::ObjectDefinition;

#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionFile {
    Many(Vec<ObjectDefinition>),
    One(Box<ObjectDefinition>),
}

/// Read and validate every definition under `dir`.
pub fn load_dir(dir: &Path) -> Result<Vec<ObjectDefinition>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading definitions directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut definitions = Vec::new();
    for path in &paths {
        let loaded = load_file(path)?;
        debug!(file = %path.display(), count = loaded.len(), "loaded definitions");
        definitions.extend(loaded);
    }
    info!(dir = %dir.display(), count = definitions.len(), "definitions loaded");
    Ok(definitions)
}

/// Read and validate the definitions in one file.
pub fn load_file(path: &Path) -> Result<Vec<ObjectDefinition>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let parsed: DefinitionFile =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let definitions = match parsed {
        DefinitionFile::Many(many) => many,
        DefinitionFile::One(one) => vec![*one],
    };
    for definition in &definitions {
        definition
            .validate()
            .with_context(|| format!("in {}", path.display()))?;
    }
    Ok(definitions)
}
