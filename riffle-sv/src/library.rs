//! Sample library indexer
//!
//! Enumerates the `.wav` files under the configured library root, selects
//! one uniformly at random, and resolves display names back to contained
//! paths. The library is a flat directory; subdirectories are skipped.

use crate::error::{Error, Result};
use rand::Rng;
use riffle_common::naming;
use std::path::{Path, PathBuf};
use tracing::warn;

/// File extension accepted by the indexer (lowercase, without the dot)
pub const SAMPLE_EXTENSION: &str = "wav";

/// One selected sample: the on-disk name and its transport-safe encoding.
///
/// Produced per selection request and discarded after use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleDescriptor {
    /// Transport-safe name used in the delivery URL
    pub display_name: String,
    /// Actual on-disk filename
    pub storage_name: String,
}

impl SampleDescriptor {
    fn from_storage_name(storage_name: String) -> Self {
        Self {
            display_name: naming::encode(&storage_name),
            storage_name,
        }
    }
}

/// Sample library rooted at a single directory
pub struct SampleLibrary {
    root: PathBuf,
}

impl SampleLibrary {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Enumerate matching storage names in the library directory.
    ///
    /// Skips subdirectories, non-`.wav` entries, and names the display codec
    /// cannot round-trip (logged once per scan).
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.root).map_err(Error::LibraryRead)?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(Error::LibraryRead)?;
            if !entry.file_type().map_err(Error::LibraryRead)?.is_file() {
                continue;
            }

            let path = entry.path();
            let is_sample = path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase() == SAMPLE_EXTENSION)
                .unwrap_or(false);
            if !is_sample {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if !naming::is_roundtrip_safe(&name) {
                warn!(
                    "Skipping {:?}: name contains the literal escape token and cannot round-trip",
                    name
                );
                continue;
            }

            names.push(name);
        }

        Ok(names)
    }

    /// Select one sample with uniform probability across all matches.
    ///
    /// Each pick is independent of prior picks. An empty library is an
    /// explicit, distinct failure rather than an out-of-range index.
    pub fn pick(&self) -> Result<SampleDescriptor> {
        let names = self.list()?;
        if names.is_empty() {
            return Err(Error::EmptyLibrary);
        }

        let index = rand::thread_rng().gen_range(0..names.len());
        Ok(SampleDescriptor::from_storage_name(names[index].clone()))
    }

    /// Resolve a display name to the file it denotes under the library root.
    ///
    /// Decodes the name, rejects anything that is not a bare filename, and
    /// verifies the canonicalized result stays inside the canonicalized root.
    /// Every failure mode is `NotFound`; a traversal attempt must not be
    /// distinguishable from a missing file.
    pub fn resolve(&self, display_name: &str) -> Result<PathBuf> {
        let storage_name = naming::decode(display_name);

        // A storage name is a single path component; separators or parent
        // references mean the request is not naming a library file.
        let as_path = Path::new(&storage_name);
        let mut components = as_path.components();
        let bare_filename = matches!(
            (components.next(), components.next()),
            (Some(std::path::Component::Normal(_)), None)
        );
        if !bare_filename {
            return Err(Error::NotFound(display_name.to_string()));
        }

        let candidate = self.root.join(&storage_name);
        let canonical = candidate
            .canonicalize()
            .map_err(|_| Error::NotFound(storage_name.clone()))?;
        let canonical_root = self
            .root
            .canonicalize()
            .map_err(|_| Error::NotFound(storage_name.clone()))?;

        if !canonical.starts_with(&canonical_root) {
            return Err(Error::NotFound(storage_name));
        }

        Ok(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    fn library_with(files: &[&str]) -> (tempfile::TempDir, SampleLibrary) {
        let dir = tempfile::tempdir().unwrap();
        for name in files {
            fs::write(dir.path().join(name), b"RIFF").unwrap();
        }
        let library = SampleLibrary::new(dir.path().to_path_buf());
        (dir, library)
    }

    #[test]
    fn test_list_filters_extension() {
        let (_dir, library) = library_with(&["kick.wav", "notes.txt", "loop.WAV"]);

        let mut names = library.list().unwrap();
        names.sort();
        assert_eq!(names, vec!["kick.wav", "loop.WAV"]);
    }

    #[test]
    fn test_list_skips_subdirectories() {
        let (dir, library) = library_with(&["kick.wav"]);
        fs::create_dir(dir.path().join("nested.wav")).unwrap();

        assert_eq!(library.list().unwrap(), vec!["kick.wav"]);
    }

    #[test]
    fn test_list_unreadable_root() {
        let library = SampleLibrary::new(PathBuf::from("/nonexistent/riffle/samples"));
        assert!(matches!(library.list(), Err(Error::LibraryRead(_))));
    }

    #[test]
    fn test_pick_empty_library_is_explicit_failure() {
        let (_dir, library) = library_with(&[]);
        assert!(matches!(library.pick(), Err(Error::EmptyLibrary)));
    }

    #[test]
    fn test_pick_encodes_display_name() {
        let (_dir, library) = library_with(&["snare#1.wav"]);

        let descriptor = library.pick().unwrap();
        assert_eq!(descriptor.storage_name, "snare#1.wav");
        assert_eq!(descriptor.display_name, "snaresharp1.wav");
    }

    #[test]
    fn test_pick_is_roughly_uniform() {
        let (_dir, library) = library_with(&["a.wav", "b.wav", "c.wav", "d.wav"]);

        let trials = 4000;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..trials {
            let descriptor = library.pick().unwrap();
            *counts.entry(descriptor.storage_name).or_insert(0) += 1;
        }

        assert_eq!(counts.len(), 4);
        for (name, count) in counts {
            // Expect ~1000 per file; allow a generous band for randomness
            assert!(
                count > 700 && count < 1300,
                "{name} picked {count} times out of {trials}"
            );
        }
    }

    #[test]
    fn test_resolve_decodes_display_name() {
        let (dir, library) = library_with(&["snare#1.wav"]);

        let path = library.resolve("snaresharp1.wav").unwrap();
        assert_eq!(
            path,
            dir.path().join("snare#1.wav").canonicalize().unwrap()
        );
    }

    #[test]
    fn test_resolve_missing_file() {
        let (_dir, library) = library_with(&["kick.wav"]);
        assert!(matches!(
            library.resolve("ghost.wav"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let (dir, library) = library_with(&["kick.wav"]);
        // A real file outside the root that a traversal would reach
        fs::write(dir.path().parent().unwrap().join("outside.wav"), b"RIFF").unwrap();

        for name in ["../outside.wav", "..", "/etc/passwd", "a/b.wav"] {
            assert!(
                matches!(library.resolve(name), Err(Error::NotFound(_))),
                "resolve accepted {name}"
            );
        }
    }
}
