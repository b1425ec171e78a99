//! # folio-covers
//!
//! Book cover artwork resolution for folio.
//!
//! A [`CoverResolver`] tries an ordered chain of lookup sources until one
//! returns a usable URL. The ordering is picked by script detection: CJK
//! titles search the scraped Chinese catalogue first, Latin titles the open
//! bibliographic APIs first. Results, including "no cover found", are
//! persisted in an on-disk cache so repeated runs don't re-query, and the
//! scraped source is throttled through a shared rate limiter.
//!
//! Resolution never fails past its boundary: any source error degrades to
//! "try next source", and exhausting the chain degrades to `None`.

pub mod cache;
pub mod rate_limit;
pub mod resolver;
pub mod script;
pub mod sources;

pub use cache::CoverCache;
pub use rate_limit::RateLimiter;
pub use resolver::{CoverResolver, CoverResolverConfig};
pub use sources::CoverSource;
