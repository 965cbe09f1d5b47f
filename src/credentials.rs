use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_FILE_NAME: &str = ".flickroauthtoken";

/// OAuth access token and its secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub secret: String,
}

/// Reads and writes the credential file.
///
/// The file is written as two lines, `token` then `secret`. Files saved by older
/// releases hold four lines (`api_key`, `api_secret`, `token`, `secret`) and are
/// still accepted.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> CredentialStore {
        CredentialStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// `None` when no credential has been saved.
    pub fn load(&self) -> Result<Option<Credential>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let lines: Vec<&str> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let (token, secret) = match lines.as_slice() {
            [token, secret] => (token, secret),
            [_api_key, _api_secret, token, secret] => (token, secret),
            _ => return Err(Error::CredentialMalformed(self.path.clone())),
        };

        Ok(Some(Credential {
            token: token.to_string(),
            secret: secret.to_string(),
        }))
    }

    pub fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path)?;
        // mode only applies on creation, tighten files saved by older releases
        #[cfg(unix)]
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
        write!(file, "{}\n{}", credential.token, credential.secret)?;
        Ok(())
    }

    /// Returns whether a file was removed.
    pub fn delete(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
