use std::path::{Path, PathBuf};

use super::validation::ConfigError;

/// `.env` locations relative to the working directory, highest priority
/// first. Variables already present in the process are never overridden.
pub const ENV_FILES: [&str; 3] = ["rag_agent/.env", "rag_pipeline/.env", ".env"];

/// Loads every `.env` file that exists under `base_dir` and returns the
/// paths that were read.
pub fn load_env_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut loaded = Vec::new();
    for relative in ENV_FILES {
        let path = base_dir.join(relative);
        if !path.is_file() {
            continue;
        }
        dotenvy::from_path(&path)
            .map_err(|e| ConfigError::Environment(format!("{}: {}", path.display(), e)))?;
        loaded.push(path);
    }
    Ok(loaded)
}
