//! Directory-of-env-files configuration source.

use super::shell::{self, ShellError};
use super::{ConfigSource, Layered, Lookup, ProcessEnv};
use crate::core::ConfigRecord;
use crate::error::{ConfigError, Result, ResultExt};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory scanned by the `confd` strategy unless configured otherwise.
pub const DEFAULT_ENV_DIR: &str = "/etc/dockervolumebackup/conf.d";

/// Env-file directory configuration source.
///
/// Every regular file in the directory describes one backup job. Files are
/// read like a shell would `source` them: each line is expanded and then
/// parsed as `KEY=VALUE` assignments. Assignments are visible to later lines
/// of the same file, and take precedence over the ambient environment when the
/// record is populated.
///
/// The process environment is only read, never modified.
///
/// # Examples
///
/// ```rust,no_run
/// use backup_config_resolver::sources::{ConfigSource, EnvDirSource};
///
/// let records = EnvDirSource::new("/etc/dockervolumebackup/conf.d").load()?;
/// for record in &records {
///     println!("{}: {}", record.source, record.backup_cron_expression);
/// }
/// # Ok::<(), backup_config_resolver::error::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct EnvDirSource<L = ProcessEnv> {
    directory: PathBuf,
    ambient: L,
}

impl EnvDirSource {
    /// Create a source over `directory`, falling back to the process
    /// environment for keys the files do not set.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self::with_ambient(directory, ProcessEnv)
    }
}

impl<L: Lookup> EnvDirSource<L> {
    /// Create a source over `directory` with a custom ambient environment.
    pub fn with_ambient(directory: impl Into<PathBuf>, ambient: L) -> Self {
        Self {
            directory: directory.into(),
            ambient,
        }
    }

    /// The directory this source reads.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Regular files of the directory, sorted by name.
    fn files(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::DirectoryNotFound(self.directory.clone()));
            }
            Err(e) => {
                return Err(ConfigError::IoError(e).context(format!(
                    "failed to read files from env directory {}",
                    self.directory.display()
                )));
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| {
                    ConfigError::IoError(e).context("failed to read files from env directory")
                })?
                .path();
            if path.is_dir() {
                continue;
            }
            files.push(path);
        }
        files.sort();
        Ok(files)
    }

    fn load_file(&self, path: &Path) -> Result<ConfigRecord> {
        let vars = source_env_file(path, &self.ambient)
            .with_context(|| format!("error reading config file {}", path.display()))?;

        let mut record = ConfigRecord::from_lookup(Layered::new(&vars, &self.ambient))
            .with_context(|| format!("error loading config from file {}", path.display()))?;

        record.source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        record.additional_env_vars = vars;
        Ok(record)
    }
}

impl<L: Lookup + Send + Sync> ConfigSource for EnvDirSource<L> {
    fn load(&self) -> Result<Vec<ConfigRecord>> {
        let files = self.files()?;
        let mut records = Vec::with_capacity(files.len());
        for path in files {
            tracing::debug!(path = %path.display(), "loading configuration from env file");
            records.push(self.load_file(&path)?);
        }
        Ok(records)
    }

    fn name(&self) -> String {
        format!("confd:{}", self.directory.display())
    }
}

/// Read an env file the way `set -a; source <path>; set +a` would, returning
/// the assignments it makes.
///
/// Lines are trimmed; blank lines and lines starting with `#` are skipped.
/// Every other line is shell-expanded with the file's earlier assignments
/// layered over `ambient`, split into words, and each word parsed as a
/// `KEY=VALUE` assignment. Later assignments to the same key win.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a line fails to expand, or an
/// expanded line is not an assignment.
pub fn source_env_file<L: Lookup + ?Sized>(
    path: &Path,
    ambient: &L,
) -> Result<BTreeMap<String, String>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::IoError(e).context(format!("error opening {}", path.display())))?;

    let mut vars = BTreeMap::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let assignments =
            shell::parse_line(line, &Layered::new(&vars, ambient)).map_err(|e| match e {
                ShellError::MalformedAssignment(_) => {
                    ConfigError::ParseError(format!("line {}: {}", index + 1, e))
                }
                e => ConfigError::Expansion {
                    line: index + 1,
                    reason: e.to_string(),
                },
            })?;
        for (key, value) in assignments {
            vars.insert(key, value);
        }
    }

    Ok(vars)
}
