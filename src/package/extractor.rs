use crate::core::{OctpkgError, OctpkgResult};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::Archive;

/// An unpacked archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Scratch directory owning everything that was unpacked
    pub scratch: PathBuf,
    /// The package root inside `scratch`
    pub root: PathBuf,
}

/// Extracts package archives (tar.gz, zip) to scratch directories
pub struct PackageExtractor {
    dest_dir: PathBuf,
}

impl PackageExtractor {
    pub fn new(dest_dir: PathBuf) -> Self {
        Self { dest_dir }
    }

    /// Scratch directory an archive unpacks into
    pub fn scratch_dir_for(&self, archive_path: &Path) -> PathBuf {
        let stem = archive_path
            .file_name()
            .and_then(|s| s.to_str())
            .map(|s| s.trim_end_matches(".gz").trim_end_matches(".tar").trim_end_matches(".tgz").trim_end_matches(".zip"))
            .unwrap_or("unknown");
        self.dest_dir.join(format!(".tmp-{}", stem))
    }

    /// Extract an archive file. Returns the scratch directory and the
    /// package root within it; on failure the scratch directory is removed.
    pub fn extract(&self, archive_path: &Path) -> OctpkgResult<Extracted> {
        let name = archive_path
            .file_name()
            .and_then(|e| e.to_str())
            .ok_or_else(|| OctpkgError::Package("Unknown archive format".to_string()))?;

        let scratch = self.scratch_dir_for(archive_path);
        let result = if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            self.prepare(&scratch).and_then(|_| extract_targz(archive_path, &scratch))
        } else if name.ends_with(".zip") {
            self.prepare(&scratch).and_then(|_| extract_zip(archive_path, &scratch))
        } else {
            return Err(OctpkgError::Package(format!(
                "Unsupported archive format: {}",
                name
            )));
        };

        match result.and_then(|_| find_root(&scratch)) {
            Ok(root) => Ok(Extracted { scratch, root }),
            Err(e) => {
                let _ = fs::remove_dir_all(&scratch);
                Err(e)
            }
        }
    }

    fn prepare(&self, scratch: &Path) -> OctpkgResult<()> {
        if scratch.exists() {
            fs::remove_dir_all(scratch)?;
        }
        fs::create_dir_all(scratch)?;
        Ok(())
    }
}

fn extract_targz(archive_path: &Path, scratch: &Path) -> OctpkgResult<()> {
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.unpack(scratch)?;
    Ok(())
}

fn extract_zip(archive_path: &Path, scratch: &Path) -> OctpkgResult<()> {
    use zip::ZipArchive;

    let file = File::open(archive_path)?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| OctpkgError::Package(format!("Invalid zip: {}", e)))?;
    archive
        .extract(scratch)
        .map_err(|e| OctpkgError::Package(format!("Extract failed: {}", e)))
}

/// Packages unpack into exactly one top-level directory
fn find_root(scratch: &Path) -> OctpkgResult<PathBuf> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(scratch)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    match dirs.len() {
        1 => Ok(dirs.remove(0)),
        0 => Err(OctpkgError::Package(
            "Archive has no root directory. Files at root level not supported.".to_string(),
        )),
        n => Err(OctpkgError::Package(format!(
            "Archive has {} top-level directories; expected one",
            n
        ))),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::path::{Path, PathBuf};

    /// Write `<dir>/<root>.tar.gz` holding `files` under `<root>/`
    pub fn write_targz(dir: &Path, root: &str, files: &[(&str, &str)]) -> PathBuf {
        let path = dir.join(format!("{}.tar.gz", root));
        let file = std::fs::File::create(&path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, format!("{}/{}", root, name), content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
        path
    }
}
