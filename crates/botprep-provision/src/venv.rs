//! Virtual environment layout and activation.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use crate::runner::{is_path_like, Invocation};

/// Paths inside a virtual environment directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenvLayout {
    root: PathBuf,
}

impl VenvLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `bin/` on Unix, `Scripts/` on Windows.
    pub fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("Scripts")
        } else {
            self.root.join("bin")
        }
    }

    pub fn python(&self) -> PathBuf {
        if cfg!(windows) {
            self.bin_dir().join("python.exe")
        } else {
            self.bin_dir().join("python")
        }
    }

    /// Anything (directory, file or dangling symlink) at the root path.
    pub fn exists(&self) -> bool {
        self.root.symlink_metadata().is_ok()
    }

    /// Remove whatever is at the root path. Returns `false` when nothing was there.
    pub fn remove(&self) -> io::Result<bool> {
        let meta = match self.root.symlink_metadata() {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if meta.is_dir() {
            std::fs::remove_dir_all(&self.root)?;
        } else {
            std::fs::remove_file(&self.root)?;
        }
        Ok(true)
    }

    /// Compute the activation context: `VIRTUAL_ENV`, and `PATH` with the
    /// environment's bin directory in front of `inherited_path`.
    pub fn activate(
        &self,
        inherited_path: Option<&OsString>,
    ) -> Result<ActivatedEnv, std::env::JoinPathsError> {
        let bin_dir = self.bin_dir();
        let mut entries = vec![bin_dir.clone()];
        if let Some(path) = inherited_path {
            entries.extend(std::env::split_paths(path));
        }
        let path = std::env::join_paths(entries)?;
        Ok(ActivatedEnv {
            root: self.root.clone(),
            python: self.python(),
            bin_dir,
            path,
        })
    }
}

/// An activated environment, applied to each invocation explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivatedEnv {
    pub root: PathBuf,
    pub bin_dir: PathBuf,
    pub python: PathBuf,
    /// Full `PATH` value for children.
    pub path: OsString,
}

impl ActivatedEnv {
    /// Add the activation variables to `invocation`.
    pub fn apply(&self, invocation: Invocation) -> Invocation {
        invocation
            .env("VIRTUAL_ENV", &self.root)
            .env("PATH", &self.path)
            .env_remove("PYTHONHOME")
    }

    /// The environment's interpreter with activation applied.
    pub fn python_invocation(&self) -> Invocation {
        self.apply(Invocation::new(&self.python))
    }

    /// Prefer the environment's copy of a bare command name (console scripts
    /// such as `alembic`) when it has been installed there.
    pub fn resolve_program(&self, program: &str) -> PathBuf {
        let as_path = Path::new(program);
        if is_path_like(as_path) {
            return as_path.to_path_buf();
        }
        let candidates = if cfg!(windows) {
            vec![self.bin_dir.join(format!("{}.exe", program)), self.bin_dir.join(program)]
        } else {
            vec![self.bin_dir.join(program)]
        };
        candidates
            .into_iter()
            .find(|p| p.is_file())
            .unwrap_or_else(|| as_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_directory_file_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let venv = VenvLayout::new(dir.path().join(".venv"));
        assert!(!venv.exists());
        assert!(!venv.remove().unwrap());

        std::fs::create_dir_all(venv.bin_dir()).unwrap();
        std::fs::write(venv.python(), b"").unwrap();
        assert!(venv.exists());
        assert!(venv.remove().unwrap());
        assert!(!venv.exists());

        std::fs::write(venv.root(), b"stray file").unwrap();
        assert!(venv.remove().unwrap());
        assert!(!venv.exists());
    }

    #[test]
    fn test_activate_prepends_bin_dir() {
        let venv = VenvLayout::new("/srv/bot/.venv");
        let inherited = std::env::join_paths(["/usr/local/bin", "/usr/bin"]).unwrap();
        let active = venv.activate(Some(&inherited)).unwrap();
        let entries: Vec<PathBuf> = std::env::split_paths(&active.path).collect();
        assert_eq!(entries[0], venv.bin_dir());
        assert_eq!(&entries[1..], &[PathBuf::from("/usr/local/bin"), PathBuf::from("/usr/bin")]);

        let inv = active.python_invocation().args(["-m", "pip"]);
        assert_eq!(inv.program, venv.python());
        assert_eq!(
            inv.env_value("VIRTUAL_ENV"),
            Some(Path::new("/srv/bot/.venv").as_os_str())
        );
        assert_eq!(inv.env_remove, vec![OsString::from("PYTHONHOME")]);
    }

    #[test]
    fn test_activate_without_inherited_path() {
        let venv = VenvLayout::new("/srv/bot/.venv");
        let active = venv.activate(None).unwrap();
        assert_eq!(active.path, venv.bin_dir().into_os_string());
    }

    #[test]
    fn test_resolve_program_prefers_env_copy() {
        let dir = tempfile::tempdir().unwrap();
        let venv = VenvLayout::new(dir.path().join(".venv"));
        let active = venv.activate(None).unwrap();
        assert_eq!(active.resolve_program("alembic"), PathBuf::from("alembic"));

        std::fs::create_dir_all(venv.bin_dir()).unwrap();
        let script = if cfg!(windows) {
            venv.bin_dir().join("alembic.exe")
        } else {
            venv.bin_dir().join("alembic")
        };
        std::fs::write(&script, b"").unwrap();
        assert_eq!(active.resolve_program("alembic"), script);
        assert_eq!(active.resolve_program("./tools/migrate"), PathBuf::from("./tools/migrate"));
    }
}
