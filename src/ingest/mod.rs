/// Source page retrieval.
///
/// The synchronizer only sees the [`Fetcher`] trait, so extraction and
/// store writes can be exercised against a saved page or a stub.
///
/// Submodules:
/// - `groupe_e`: live page over HTTP (blocking reqwest).
/// - `file`: page captured earlier and saved to disk.

pub mod file;
pub mod groupe_e;

use crate::model::FetchError;

pub use file::FileFetcher;
pub use groupe_e::HttpFetcher;

/// Capability to obtain the HTML text found at a URL.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url)
    }
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url)
    }
}
