//! Relocation of ingested files into `<archive_dir>/<YYYY-MM>/`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};

/// Archive folder for a file: its name's date prefix month, else `now`'s.
pub fn period(file_date: Option<NaiveDate>, now: DateTime<Utc>) -> String {
    match file_date {
        Some(date) => date.format("%Y-%m").to_string(),
        None => now.format("%Y-%m").to_string(),
    }
}

/// First free path for `file_name` in `dir`: the name itself, then
/// `stem_1.ext`, `stem_2.ext`, ...
pub fn unique_destination(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };
    (1u32..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem}_{n}.{ext}")),
            None => dir.join(format!("{stem}_{n}")),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Moves `path` under `archive_root/<period>/` and returns the new location.
///
/// Falls back to copy-and-delete when a rename crosses filesystems.
pub fn archive_file(
    path: &Path,
    archive_root: &Path,
    file_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> io::Result<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "file name is not UTF-8"))?;
    let dir = archive_root.join(period(file_date, now));
    fs::create_dir_all(&dir)?;
    let dest = unique_destination(&dir, file_name);
    if fs::rename(path, &dest).is_err() {
        fs::copy(path, &dest)?;
        fs::remove_file(path)?;
    }
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn period_prefers_the_file_date() {
        assert_eq!(period(NaiveDate::from_ymd_opt(2026, 1, 12), now()), "2026-01");
        assert_eq!(period(None, now()), "2026-03");
    }

    #[test]
    fn moves_and_deduplicates() {
        let tmp = tempfile::tempdir().unwrap();
        let inbox = tmp.path().join("raw");
        let archive = tmp.path().join("archive");
        fs::create_dir_all(&inbox).unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 1, 12);
        let mut moved = Vec::new();
        for body in ["one", "two", "three"] {
            let src = inbox.join("20260112_gold_stocks.xls");
            fs::write(&src, body).unwrap();
            moved.push(archive_file(&src, &archive, date, now()).unwrap());
            assert!(!src.exists());
        }

        let month = archive.join("2026-01");
        assert_eq!(
            moved,
            [
                month.join("20260112_gold_stocks.xls"),
                month.join("20260112_gold_stocks_1.xls"),
                month.join("20260112_gold_stocks_2.xls"),
            ]
        );
        assert_eq!(fs::read_to_string(&moved[2]).unwrap(), "three");
    }

    #[test]
    fn names_without_extension() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("notice"), "").unwrap();
        assert_eq!(
            unique_destination(tmp.path(), "notice"),
            tmp.path().join("notice_1")
        );
    }

    #[test]
    fn missing_source_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = archive_file(&tmp.path().join("gone.pdf"), tmp.path(), None, now());
        assert!(err.is_err());
    }
}
