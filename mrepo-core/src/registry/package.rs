//! Package archive inspection
//!
//! A module package is a zip archive carrying `module.prop` either at the
//! archive root or one directory deep. Gzip-compressed tarballs with the
//! same layout are accepted as well.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path};

use crate::module::{Module, MODULE_PROP};

/// Upper bound on the size of a `module.prop` we are willing to read
const MAX_PROP_SIZE: u64 = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    /// Sniff the format from the leading magic bytes
    fn detect(path: &Path) -> io::Result<Option<Self>> {
        let mut magic = [0u8; 4];
        let mut file = File::open(path)?;
        let read = file.read(&mut magic)?;

        Ok(match &magic[..read] {
            [b'P', b'K', 0x03, 0x04] | [b'P', b'K', 0x05, 0x06] => Some(Self::Zip),
            [0x1f, 0x8b, ..] => Some(Self::TarGz),
            _ => None,
        })
    }
}

/// Parse `module.prop` out of the package at `path`
///
/// Returns `None` for anything that is not a readable package with a valid
/// property file.
pub fn read_package_metadata(path: &Path) -> Option<Module> {
    let content = match ArchiveFormat::detect(path) {
        Ok(Some(ArchiveFormat::Zip)) => read_zip_prop(path),
        Ok(Some(ArchiveFormat::TarGz)) => read_tar_gz_prop(path),
        Ok(None) => {
            tracing::debug!("Not a package archive {}", path.display());
            return None;
        }
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", path.display(), e);
            return None;
        }
    };

    match content {
        Ok(Some(content)) => match Module::from_prop(&content) {
            Ok(module) => Some(module),
            Err(e) => {
                tracing::debug!("Package {} has an invalid {}: {}", path.display(), MODULE_PROP, e);
                None
            }
        },
        Ok(None) => {
            tracing::debug!("Package {} has no {}", path.display(), MODULE_PROP);
            None
        }
        Err(e) => {
            tracing::debug!("Corrupted package archive {}: {}", path.display(), e);
            None
        }
    }
}

fn read_zip_prop(path: &Path) -> io::Result<Option<String>> {
    let mut archive = zip::ZipArchive::new(File::open(path)?).map_err(io::Error::other)?;

    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(io::Error::other)?;
        if entry.is_dir() || !is_prop_path(Path::new(entry.name())) {
            continue;
        }

        let mut content = String::new();
        entry.take(MAX_PROP_SIZE).read_to_string(&mut content)?;
        return Ok(Some(content));
    }

    Ok(None)
}

fn read_tar_gz_prop(path: &Path) -> io::Result<Option<String>> {
    let file = File::open(path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    for entry in archive.entries()? {
        let entry = entry?;
        if !is_prop_path(&entry.path()?) {
            continue;
        }

        let mut content = String::new();
        entry.take(MAX_PROP_SIZE).read_to_string(&mut content)?;
        return Ok(Some(content));
    }

    Ok(None)
}

/// `module.prop` or `<dir>/module.prop`
fn is_prop_path(path: &Path) -> bool {
    let names: Vec<_> = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    match names.as_slice() {
        [Component::Normal(file)] => *file == MODULE_PROP,
        [Component::Normal(_), Component::Normal(file)] => *file == MODULE_PROP,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::CompressionMethod;

    fn write_zip(path: &Path, entry_path: &str, prop: &str, method: CompressionMethod) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        writer
            .start_file(entry_path, SimpleFileOptions::default().compression_method(method))
            .unwrap();
        writer.write_all(prop.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    fn write_tar_gz(path: &Path, entry_path: &str, prop: &str) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

        let mut header = tar::Header::new_gnu();
        header.set_size(prop.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, entry_path, prop.as_bytes())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_stored_zip_at_root() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("module.zip");
        write_zip(&path, "module.prop", "id=demo\nversionCode=3\n", CompressionMethod::Stored);

        let module = read_package_metadata(&path).unwrap();
        assert_eq!(module.id, "demo");
        assert_eq!(module.version_code, 3);
    }

    #[test]
    fn test_deflated_zip_one_level_deep() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("module.zip");
        write_zip(&path, "demo/module.prop", "id=demo\n", CompressionMethod::Deflated);

        assert_eq!(read_package_metadata(&path).unwrap().id, "demo");
    }

    #[test]
    fn test_zip_too_deep_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("module.zip");
        write_zip(&path, "a/b/module.prop", "id=demo\n", CompressionMethod::Deflated);

        assert!(read_package_metadata(&path).is_none());
    }

    #[test]
    fn test_tar_gz_is_accepted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("module.tar.gz");
        write_tar_gz(&path, "demo/module.prop", "id=demo\nversionCode=2\n");

        assert_eq!(read_package_metadata(&path).unwrap().version_code, 2);
    }

    #[test]
    fn test_not_an_archive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        std::fs::write(&path, "id=demo\n").unwrap();
        let truncated = temp_dir.path().join("truncated.zip");
        std::fs::write(&truncated, b"PK\x03\x04 but not really").unwrap();

        assert!(read_package_metadata(&path).is_none());
        assert!(read_package_metadata(&truncated).is_none());
        assert!(read_package_metadata(&temp_dir.path().join("missing")).is_none());
    }

    #[test]
    fn test_invalid_prop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("module.zip");
        write_zip(&path, "module.prop", "name=no id here\n", CompressionMethod::Deflated);

        assert!(read_package_metadata(&path).is_none());
    }
}
