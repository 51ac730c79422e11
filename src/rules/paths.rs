use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Deserializer};
use simple_expand_tilde::expand_tilde;

#[cfg(test)]
use std::convert::Into;

/// Expand '~' in the given path.
pub fn normalize_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    expand_tilde(path.as_ref()).ok_or_else(|| anyhow!("Cannot expand ~ to a home directory"))
}

/// Paths used by the program for various purposes.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AuxillaryPaths {
    /// The directory where raw statements are archived and spreadsheets are written.
    #[serde(deserialize_with = "deserialize_path")]
    pub storage: PathBuf,
}

impl AuxillaryPaths {
    /// Construct a new object - only needed for testing.
    #[cfg(test)]
    pub fn new(storage: impl Into<PathBuf>) -> Self {
        AuxillaryPaths {
            storage: storage.into(),
        }
    }

    // Ensure the contained data is correct.
    pub fn validate(&self) -> Result<()> {
        // The storage directory must be a directory.
        if !self.storage.is_dir() {
            return Err(anyhow!(
                "The storage path {} is not a directory.",
                self.storage.display()
            ));
        }

        Ok(())
    }
}

/// Instructions on how to deserialize a path object.
fn deserialize_path<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    normalize_path(s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod test {
    use std::fs;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn paths_from_toml(storage: &Path) -> AuxillaryPaths {
        toml::from_str(&format!("storage = {:#?}\n", storage)).unwrap()
    }

    #[test]
    fn test_storage_tilde_is_expanded_when_read() {
        let paths: AuxillaryPaths = toml::from_str("storage = \"~/extractos\"\n").unwrap();
        assert!(!paths.storage.starts_with("~"));
        assert!(paths.storage.ends_with("extractos"));
    }

    #[test]
    fn test_absolute_storage_is_kept() {
        let temp = tempdir::TempDir::new("extractos").unwrap();
        assert_eq!(paths_from_toml(temp.path()), AuxillaryPaths::new(temp.path()));
    }

    #[rstest]
    #[case("no_existe")]
    #[case("bancolombia_julio.csv")]
    fn test_storage_must_be_an_existing_directory(#[case] name: &str) {
        let temp = tempdir::TempDir::new("extractos").unwrap();
        let storage = temp.path().join(name);
        if name.ends_with(".csv") {
            fs::write(&storage, "FECHA,DESCRIPCIÓN,VALOR\n").unwrap();
        }
        let message = paths_from_toml(&storage)
            .validate()
            .err()
            .unwrap()
            .to_string();
        assert_eq!(
            message,
            format!("The storage path {} is not a directory.", storage.display())
        );
    }

    #[test]
    fn test_storage_directory_is_valid() {
        let temp = tempdir::TempDir::new("extractos").unwrap();
        fs::create_dir(temp.path().join("new")).unwrap();
        assert!(AuxillaryPaths::new(temp.path()).validate().is_ok());
    }
}
