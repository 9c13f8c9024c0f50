use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::Write;
use std::path::Path;

use super::{ensure_parent_dir, Config};

const HEADER: &str = "\
# wavelight configuration
#
# ranking.window   trailing window for current rankings (humantime, e.g. \"365 days\")
# scoring.points   points for 1st, 2nd, 3rd... in each event
# relay            which events hold individual relay legs
# events           explicit time/field classification (exact names or globs)
";

/// Write the default configuration to `path`.
///
/// Refuses to replace an existing file unless `force` is set. The file is
/// written atomically so a failed write never leaves a truncated config.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    ensure_parent_dir(path)?;

    let yaml = serde_saphyr::to_string(&Config::default())
        .context("Failed to serialize default config")?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(HEADER.as_bytes()).context("Failed to write config")?;
    file.write_all(yaml.as_bytes()).context("Failed to write config")?;
    file.commit().context("Failed to save config")?;

    tracing::info!(path = %path.display(), "wrote default config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;

    #[test]
    fn test_written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        write_default_config(&path, false).unwrap();
        let loaded = load_config(Some(path)).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "database: /keep/me.db\n").unwrap();

        assert!(write_default_config(&path, false).is_err());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "database: /keep/me.db\n");

        write_default_config(&path, true).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# wavelight configuration"));
    }
}
