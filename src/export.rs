use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, Timelike};
use tracing::{debug, info};

/// Default filename prefix for exported term files, matching the page title.
pub const DEFAULT_EXPORT_PREFIX: &str = "DeCSFinder";

/// Builds the `<prefix>_HH:MM:SS.txt` export filename from a clock reading,
/// zero-padded on a 24-hour clock.
pub fn export_filename(prefix: &str, time: impl Timelike) -> String {
    format!(
        "{prefix}_{:02}:{:02}:{:02}.txt",
        time.hour(),
        time.minute(),
        time.second()
    )
}

/// Saves `text` into `dir` as a UTF-8 plain-text file stamped with the
/// current local time, returning the written path.
///
/// Blank text (empty or whitespace-only) is skipped with `Ok(None)`; the
/// export button is a convenience, not something worth an error dialog.
pub fn export_terms(prefix: &str, text: &str, dir: &Path) -> io::Result<Option<PathBuf>> {
    if text.trim().is_empty() {
        debug!("Skipping export, nothing to save");
        return Ok(None);
    }
    fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(prefix, Local::now().time()));
    fs::write(&path, text)?;
    info!(path = %path.display(), bytes = text.len(), "Exported terms");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use std::env;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEMP_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

    struct TempDir {
        path: PathBuf,
    }

    impl TempDir {
        fn new(prefix: &str) -> Self {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos();
            let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
            let mut path = env::temp_dir();
            path.push(format!(
                "decsfinder-{prefix}-{}-{nanos}-{counter}",
                std::process::id()
            ));
            fs::create_dir_all(&path).unwrap();
            Self { path }
        }

        fn path(&self) -> &Path {
            &self.path
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn filename_zero_pads_every_clock_field() {
        let time = NaiveTime::from_hms_opt(9, 5, 3).unwrap();
        assert_eq!(
            export_filename(DEFAULT_EXPORT_PREFIX, time),
            "DeCSFinder_09:05:03.txt"
        );
        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        assert_eq!(export_filename("X", midnight), "X_00:00:00.txt");
        let evening = NaiveTime::from_hms_opt(23, 59, 59).unwrap();
        assert_eq!(export_filename("X", evening), "X_23:59:59.txt");
    }

    #[test]
    fn blank_text_is_a_no_op() {
        let tmp = TempDir::new("blank");
        for text in ["", "  ", "\n\t "] {
            let written = export_terms(DEFAULT_EXPORT_PREFIX, text, tmp.path()).unwrap();
            assert!(written.is_none(), "blank text {text:?} must not export");
        }
        let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
        assert!(entries.is_empty());
    }

    #[test]
    fn export_writes_the_text_verbatim() {
        let tmp = TempDir::new("write");
        let text = "diabetes mellitus\ninsulina — glucemia ≥ 7 mmol\n";
        let path = export_terms(DEFAULT_EXPORT_PREFIX, text, tmp.path())
            .unwrap()
            .expect("non-blank text exports");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("DeCSFinder_"), "{name}");
        assert!(name.ends_with(".txt"), "{name}");
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn export_creates_the_target_directory() {
        let tmp = TempDir::new("mkdir");
        let nested = tmp.path().join("exports").join("today");
        let path = export_terms("Terms", "abc", &nested).unwrap().unwrap();
        assert!(path.starts_with(&nested));
        assert_eq!(fs::read_to_string(&path).unwrap(), "abc");
    }
}
