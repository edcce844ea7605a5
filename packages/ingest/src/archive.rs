//! Extraction of zipped source tables.

use std::path::Path;

use crate::IngestError;

/// Extracts `entry_name` from the archive at `zip_path` into `target`
/// unless `target` already exists or there is no archive.
///
/// The entry is matched case-insensitively on its file name, ignoring any
/// directory prefix inside the archive. Returns whether a file was written.
///
/// # Errors
///
/// Returns [`IngestError::Io`] on file system failures or
/// [`IngestError::Zip`] if the archive is corrupt or lacks the entry.
pub fn extract_if_missing(
    zip_path: &Path,
    entry_name: &str,
    target: &Path,
) -> Result<bool, IngestError> {
    if target.exists() || !zip_path.exists() {
        return Ok(false);
    }

    log::info!(
        "Extracting {entry_name} from {} to {}",
        zip_path.display(),
        target.display()
    );

    let io_err = |path: &Path, e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    };

    let file = std::fs::File::open(zip_path).map_err(|e| io_err(zip_path, e))?;
    let mut archive = zip::ZipArchive::new(file)?;

    let wanted = entry_name.to_ascii_lowercase();
    let index = (0..archive.len())
        .find(|&i| {
            archive.name_for_index(i).is_some_and(|name| {
                name.rsplit('/')
                    .next()
                    .is_some_and(|base| base.to_ascii_lowercase() == wanted)
            })
        })
        .ok_or(zip::result::ZipError::FileNotFound)?;

    let mut entry = archive.by_index(index)?;

    if let Some(parent) = target.parent() {
        crate::paths::ensure_dir(parent).map_err(|e| io_err(parent, e))?;
    }

    // A failed extraction must not leave a truncated table behind.
    let partial = target.with_extension("partial");
    let mut out = std::fs::File::create(&partial).map_err(|e| io_err(&partial, e))?;
    std::io::copy(&mut entry, &mut out).map_err(|e| io_err(&partial, e))?;
    drop(out);
    std::fs::rename(&partial, target).map_err(|e| io_err(target, e))?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn write_zip(path: &Path, entry: &str, contents: &[u8]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip_writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        zip_writer.start_file(entry, options).unwrap();
        zip_writer.write_all(contents).unwrap();
        zip_writer.finish().unwrap();
    }

    #[test]
    fn extracts_missing_table() {
        let tmp = std::env::temp_dir().join("franchise_zones_archive_extract");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let zip_path = tmp.join("base-cc-logement-2021.zip");
        write_zip(&zip_path, "data/BASE-CC-LOGEMENT-2021.CSV", b"CODGEO;P21_MEN\n");
        let target = tmp.join("base-cc-logement-2021.CSV");

        assert!(extract_if_missing(&zip_path, "base-cc-logement-2021.CSV", &target).unwrap());
        assert_eq!(std::fs::read(&target).unwrap(), b"CODGEO;P21_MEN\n");

        // Second call sees the extracted file and does nothing.
        assert!(!extract_if_missing(&zip_path, "base-cc-logement-2021.CSV", &target).unwrap());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_entry_is_an_error() {
        let tmp = std::env::temp_dir().join("franchise_zones_archive_missing_entry");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let zip_path = tmp.join("other.zip");
        write_zip(&zip_path, "readme.txt", b"hello");

        let err = extract_if_missing(&zip_path, "table.csv", &tmp.join("table.csv")).unwrap_err();
        assert!(matches!(err, IngestError::Zip(_)));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn no_archive_is_not_an_error() {
        let tmp = std::env::temp_dir().join("franchise_zones_archive_none");
        assert!(!extract_if_missing(&tmp.join("absent.zip"), "x.csv", &tmp.join("x.csv")).unwrap());
    }
}
