//! Cover lookup sources.
//!
//! Every source exposes the same capability (title and optional author in,
//! optional cover URL out), so the resolver can hold them as a uniform
//! ordered chain and new sources can be added without touching call sites.

use async_trait::async_trait;

use folio_core::Result;

pub mod douban;
pub mod google_books;
pub mod open_library;

pub use douban::DoubanSource;
pub use google_books::GoogleBooksSource;
pub use open_library::OpenLibrarySource;

/// One external cover lookup source.
#[async_trait]
pub trait CoverSource: Send + Sync {
    /// Source name for logging and diagnostics.
    fn name(&self) -> &'static str;

    /// Look up a cover image URL.
    ///
    /// `Ok(None)` means the source answered but found nothing; `Err` means
    /// the lookup itself failed. The resolver treats both as "fall through
    /// to the next source".
    async fn lookup(&self, title: &str, author: Option<&str>) -> Result<Option<String>>;
}
