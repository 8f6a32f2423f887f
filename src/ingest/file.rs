/// Replay of a saved source page
///
/// When the live page is unavailable, or to reproduce a scrape that went
/// wrong, save the page (`curl -o page.html <url>`) and point the service
/// at the file. The URL passed to `fetch` is ignored.

use std::path::{Path, PathBuf};

use crate::ingest::Fetcher;
use crate::model::FetchError;

pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Fetcher for FileFetcher {
    fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        let bytes = std::fs::read(&self.path)
            .map_err(|e| FetchError::Io(format!("{}: {}", self.path.display(), e)))?;
        String::from_utf8(bytes)
            .map_err(|e| FetchError::Decode(format!("{}: {}", self.path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("niveau_lacs_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_reads_saved_page() {
        let path = temp_path("page.html");
        std::fs::write(&path, "<table></table>").unwrap();
        let page = FileFetcher::new(&path).fetch("ignored").expect("file should read");
        assert_eq!(page, "<table></table>");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let fetcher = FileFetcher::new(temp_path("does_not_exist.html"));
        assert!(matches!(fetcher.fetch("ignored"), Err(FetchError::Io(_))));
    }

    #[test]
    fn test_non_utf8_file_is_decode_error() {
        let path = temp_path("latin1.html");
        std::fs::write(&path, [b'<', b'p', b'>', 0xE8, b'<']).unwrap();
        assert!(matches!(FileFetcher::new(&path).fetch("ignored"), Err(FetchError::Decode(_))));
        let _ = std::fs::remove_file(&path);
    }
}
