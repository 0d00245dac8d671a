//! Pre-spawn validation of the llama-server binary and model source.

use std::path::{Path, PathBuf};

use llamadeck_core::{ProcessError, ServerConfig};
use tracing::debug;

/// Resolve the configured binary to a path that exists and is executable.
///
/// A bare name (no directory component) is looked up in `PATH`. Anything
/// else must exist on disk as given.
pub fn resolve_binary(path: &Path) -> Result<PathBuf, ProcessError> {
    if path.as_os_str().is_empty() {
        return Err(ProcessError::BinaryNotFound(
            "no llama-server binary configured".to_string(),
        ));
    }

    if is_bare_name(path) {
        let found = which::which(path).map_err(|e| {
            ProcessError::BinaryNotFound(format!("{} not found in PATH: {e}", path.display()))
        })?;
        debug!(binary = %found.display(), "Resolved llama-server from PATH");
        return Ok(found);
    }

    validate_binary(path)
}

/// Check that the model file or models directory named by `config` exists.
///
/// A config with neither is allowed; llama-server then decides on its own.
pub fn validate_model_source(config: &ServerConfig) -> Result<(), ProcessError> {
    if let Some(model) = &config.model_path {
        if !model.exists() {
            return Err(ProcessError::ModelNotFound(model.display().to_string()));
        }
    } else if let Some(dir) = &config.models_dir {
        if !dir.is_dir() {
            return Err(ProcessError::ModelNotFound(dir.display().to_string()));
        }
    }
    Ok(())
}

fn is_bare_name(path: &Path) -> bool {
    path.parent().is_none_or(|parent| parent.as_os_str().is_empty())
}

fn validate_binary(path: &Path) -> Result<PathBuf, ProcessError> {
    if !path.exists() {
        return Err(ProcessError::BinaryNotFound(path.display().to_string()));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(path).map_err(|e| {
            ProcessError::BinaryNotFound(format!("{}: {e}", path.display()))
        })?;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(ProcessError::BinaryNotFound(format!(
                "{} is not executable",
                path.display()
            )));
        }
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_binary() {
        let result = resolve_binary(Path::new("/nonexistent/path/to/llama-server"));
        assert!(matches!(result, Err(ProcessError::BinaryNotFound(_))));
    }

    #[test]
    fn test_bare_name_not_in_path() {
        let result = resolve_binary(Path::new("llamadeck-definitely-not-installed"));
        assert!(matches!(result, Err(ProcessError::BinaryNotFound(_))));
    }

    #[test]
    fn test_empty_binary() {
        assert!(resolve_binary(Path::new("")).is_err());
    }

    #[test]
    #[cfg(unix)]
    fn test_non_executable_binary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("llama-server");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            resolve_binary(&path),
            Err(ProcessError::BinaryNotFound(msg)) if msg.contains("not executable")
        ));
    }

    #[test]
    #[cfg(unix)]
    fn test_executable_binary() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("llama-server");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(resolve_binary(&path).unwrap(), path);
    }

    #[test]
    fn test_model_source_validation() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("m.gguf");

        let config = ServerConfig::default().with_model_path(&model);
        assert!(matches!(
            validate_model_source(&config),
            Err(ProcessError::ModelNotFound(_))
        ));

        std::fs::write(&model, "gguf").unwrap();
        assert!(validate_model_source(&config).is_ok());

        let config = ServerConfig::default().with_models_dir(dir.path().join("missing"));
        assert!(validate_model_source(&config).is_err());

        let config = ServerConfig::default().with_models_dir(dir.path());
        assert!(validate_model_source(&config).is_ok());

        assert!(validate_model_source(&ServerConfig::default()).is_ok());
    }
}
