use crate::config::MAX_INPUT_SIZE;
use crate::error::{Result, SbfError};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::TryRngCore;
use rand::rngs::OsRng;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Length of each salt in bytes. Equal to the maximum element length
/// so the XOR step in index derivation never runs out of salt.
pub const SALT_LENGTH: usize = MAX_INPUT_SIZE;

/// One secret salt per hash round, owned by the filter for its
/// lifetime. Salts persist to a text file as one base64 line each, so
/// a filter can be rebuilt later with the exact same cell mapping.
#[derive(Clone)]
pub struct SaltStore {
    salts: Vec<[u8; SALT_LENGTH]>,
}

impl SaltStore {
    /// Loads salts from `path` if it exists, otherwise generates
    /// `hash_count` fresh salts from the OS random source and writes
    /// them to `path`.
    pub fn load_or_create(path: &Path, hash_count: usize) -> Result<Self> {
        if path.exists() {
            Self::load(path, hash_count)
        } else {
            let store = Self::generate(hash_count)?;
            store.save(path)?;
            Ok(store)
        }
    }

    /// Generates `hash_count` salts from the OS CSPRNG. Randomness
    /// failure is fatal: no valid filter can exist without secrets.
    pub fn generate(hash_count: usize) -> Result<Self> {
        let mut salts = Vec::with_capacity(hash_count);
        for _ in 0..hash_count {
            let mut buffer = [0u8; SALT_LENGTH];
            OsRng
                .try_fill_bytes(&mut buffer)
                .map_err(|e| SbfError::RandomnessFailure(e.to_string()))?;
            salts.push(buffer);
        }
        info!(hash_count, "generated fresh hash salts");
        Ok(Self { salts })
    }

    /// Reads `hash_count` base64-encoded salts, one per line. Files
    /// with fewer lines or entries that do not decode to exactly
    /// [`SALT_LENGTH`] bytes are rejected.
    pub fn load(path: &Path, hash_count: usize) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut salts = Vec::with_capacity(hash_count);

        for (line_no, line) in reader.lines().enumerate() {
            if salts.len() == hash_count {
                break;
            }
            let line = line?;
            let decoded = BASE64.decode(line.trim_end()).map_err(|source| {
                SbfError::SaltDecode {
                    line: line_no + 1,
                    source,
                }
            })?;
            let salt: [u8; SALT_LENGTH] =
                decoded.try_into().map_err(|bytes: Vec<u8>| {
                    SbfError::SaltLengthMismatch {
                        line: line_no + 1,
                        found: bytes.len(),
                        expected: SALT_LENGTH,
                    }
                })?;
            salts.push(salt);
        }

        if salts.len() < hash_count {
            return Err(SbfError::SaltFileTooShort {
                expected: hash_count,
                found: salts.len(),
            });
        }

        info!(hash_count, path = %path.display(), "loaded hash salts");
        Ok(Self { salts })
    }

    /// Writes the salts to `path`, one base64 line per salt.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for salt in &self.salts {
            writeln!(writer, "{}", BASE64.encode(salt))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.salts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.salts.is_empty()
    }

    pub fn get(&self, round: usize) -> &[u8; SALT_LENGTH] {
        &self.salts[round]
    }

    /// Builds a store from raw salts; mainly useful for deterministic
    /// tests and for callers that manage persistence themselves.
    pub fn from_salts(salts: Vec<[u8; SALT_LENGTH]>) -> Self {
        Self { salts }
    }
}

impl std::fmt::Debug for SaltStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Salts are secrets, never print their contents
        write!(f, "SaltStore {{ count: {} }}", self.salts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_generate_has_requested_count() {
        let store = SaltStore::generate(5).unwrap();
        assert_eq!(store.len(), 5);
        assert_eq!(store.get(0).len(), SALT_LENGTH);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salts.txt");

        let store = SaltStore::generate(4).unwrap();
        store.save(&path).unwrap();

        let reloaded = SaltStore::load(&path, 4).unwrap();
        for round in 0..4 {
            assert_eq!(store.get(round), reloaded.get(round));
        }
    }

    #[test]
    fn test_load_or_create_persists_then_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salts.txt");

        let first = SaltStore::load_or_create(&path, 3).unwrap();
        assert!(path.exists());
        let second = SaltStore::load_or_create(&path, 3).unwrap();
        for round in 0..3 {
            assert_eq!(first.get(round), second.get(round));
        }
    }

    #[test]
    fn test_short_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salts.txt");

        SaltStore::generate(2).unwrap().save(&path).unwrap();
        let err = SaltStore::load(&path, 5).unwrap_err();
        assert!(matches!(
            err,
            SbfError::SaltFileTooShort {
                expected: 5,
                found: 2
            }
        ));
    }

    #[test]
    fn test_wrong_length_entry_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salts.txt");

        let short = BASE64.encode([0u8; 16]);
        fs::write(&path, format!("{short}\n")).unwrap();

        let err = SaltStore::load(&path, 1).unwrap_err();
        assert!(matches!(
            err,
            SbfError::SaltLengthMismatch {
                line: 1,
                found: 16,
                ..
            }
        ));
    }

    #[test]
    fn test_garbage_line_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salts.txt");
        fs::write(&path, "!!! not base64 !!!\n").unwrap();

        let err = SaltStore::load(&path, 1).unwrap_err();
        assert!(matches!(err, SbfError::SaltDecode { line: 1, .. }));
    }

    #[test]
    fn test_debug_does_not_leak_salt_bytes() {
        let store = SaltStore::from_salts(vec![[0xAB; SALT_LENGTH]]);
        let printed = format!("{store:?}");
        assert!(!printed.contains("171"));
        assert!(printed.contains("count: 1"));
    }
}
