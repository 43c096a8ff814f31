use std::{
    env, io,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};

const APPLICATION_DIR: &str = "workhours";

/// Resolves the directory holding reports, calendar, settings, widget state and logs.
/// By default it's `$XDG_STATE_HOME/workhours` or `$HOME/.local/state/workhours`.
pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path = PathBuf::from(
                env::var("APPDATA").map_err(|_| anyhow!("APPDATA should be present on Windows"))?,
            );
            path.push(APPLICATION_DIR);
            path
        }
        #[cfg(not(windows))]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .map_err(|_| anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))?;
            path.push(APPLICATION_DIR);
            path
        }
    };

    ensure_dir(path)
}

/// Uses an explicitly provided directory, falling back to the default one. The result is
/// absolute, it gets handed over to daemons that don't share our working directory.
pub fn resolve_application_path(dir: Option<&Path>) -> Result<PathBuf> {
    let path = match dir {
        Some(dir) => ensure_dir(dir.to_path_buf())?,
        None => create_application_default_path()?,
    };
    Ok(std::fs::canonicalize(path)?)
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf> {
    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use anyhow::Result;
    use tempfile::tempdir;

    use super::resolve_application_path;

    #[test]
    fn explicit_dir_is_created_and_made_absolute() -> Result<()> {
        let dir = tempdir()?;
        let resolved = resolve_application_path(Some(&dir.path().join("nested/../state")))?;
        assert!(resolved.is_dir());
        assert_eq!(resolved, dir.path().canonicalize()?.join("state"));
        Ok(())
    }

    #[test]
    fn relative_dir_is_resolved_against_working_directory() -> Result<()> {
        let relative = Path::new("target/workhours-relative-dir");
        let resolved = resolve_application_path(Some(relative))?;
        assert!(resolved.is_absolute());
        assert_eq!(resolved, std::env::current_dir()?.canonicalize()?.join(relative));
        Ok(())
    }
}
