use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use crate::error::{Aa01Error, Result};

use super::structures::{DataRecord, Entity};

/// What to do when the destination file already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Replace existing files
    #[default]
    Always,
    /// Leave existing files alone and report them as skipped
    Never,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub overwrite: OverwritePolicy,
}

/// Result of extracting a single data record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    Written { path: PathBuf, bytes: u64 },
    Skipped { path: PathBuf },
    /// Directories and empty files carry no payload and write nothing.
    NoContent,
}

/// Totals for a whole extraction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: usize,
    pub bytes: u64,
    pub skipped: usize,
}

impl ExtractStats {
    pub fn record(&mut self, outcome: &ExtractOutcome) {
        match outcome {
            ExtractOutcome::Written { bytes, .. } => {
                self.files += 1;
                self.bytes += bytes;
            }
            ExtractOutcome::Skipped { .. } => self.skipped += 1,
            ExtractOutcome::NoContent => {}
        }
    }
}

/// Writes data record payloads below a destination directory.
///
/// Only file contents are written. Ownership, modes and timestamps from
/// metadata records are not restored.
pub struct Aa01Extractor {
    dest: PathBuf,
    options: ExtractOptions,
}

impl Aa01Extractor {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self::with_options(dest, ExtractOptions::default())
    }

    pub fn with_options(dest: impl Into<PathBuf>, options: ExtractOptions) -> Self {
        Self {
            dest: dest.into(),
            options,
        }
    }

    /// Where an archive path lands below the destination.
    pub fn output_path(&self, archive_path: &str) -> Result<PathBuf> {
        Ok(self.dest.join(sanitize_path(archive_path)?))
    }

    /// Extract one data record.
    pub fn extract_record(&self, record: &DataRecord) -> Result<ExtractOutcome> {
        let Some(payload) = record.payload.as_ref().filter(|_| record.has_content()) else {
            return Ok(ExtractOutcome::NoContent);
        };

        let output_path = self.output_path(record.path.as_deref().unwrap_or_default())?;

        if self.options.overwrite == OverwritePolicy::Never && output_path.exists() {
            log::warn!("{} exists, skipping", output_path.display());
            return Ok(ExtractOutcome::Skipped { path: output_path });
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|source| Aa01Error::Extract {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut file = fs::File::create(&output_path).map_err(|source| Aa01Error::Extract {
            path: output_path.clone(),
            source,
        })?;

        let mut view = payload.clone();
        let bytes = view.copy_to(&mut file).map_err(|e| match e {
            Aa01Error::Io(source) => Aa01Error::Extract {
                path: output_path.clone(),
                source,
            },
            other => other,
        })?;

        log::debug!("wrote {} bytes to {}", bytes, output_path.display());
        Ok(ExtractOutcome::Written {
            path: output_path,
            bytes,
        })
    }

    /// Extract every data record in `entities`, ignoring all other entities.
    ///
    /// Stops at the first decode or I/O error.
    pub fn extract_all<I>(&self, entities: I) -> Result<ExtractStats>
    where
        I: IntoIterator<Item = Result<Entity>>,
    {
        let mut stats = ExtractStats::default();
        for entity in entities {
            if let Entity::Data(record) = entity? {
                stats.record(&self.extract_record(&record)?);
            }
        }
        Ok(stats)
    }
}

/// Copy a data record's payload to `writer`. Returns the bytes written.
pub fn write_payload<W: Write + ?Sized>(record: &DataRecord, writer: &mut W) -> Result<u64> {
    match record.payload.as_ref().filter(|_| record.has_content()) {
        Some(payload) => payload.clone().copy_to(writer),
        None => Ok(0),
    }
}

/// Turn an archive path into a relative path that stays below the
/// destination directory.
///
/// Empty and absolute paths, NUL bytes and `..` components are rejected;
/// `.` components are dropped.
pub fn sanitize_path(archive_path: &str) -> Result<PathBuf> {
    let unsafe_path = || Aa01Error::UnsafePath {
        path: archive_path.to_string(),
    };

    if archive_path.contains('\0') {
        return Err(unsafe_path());
    }

    let mut out = PathBuf::new();
    for component in Path::new(archive_path).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_path());
            }
        }
    }

    if out.as_os_str().is_empty() {
        return Err(unsafe_path());
    }
    Ok(out)
}
