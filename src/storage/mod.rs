//! Arena-backed storage for a single bucket.
//!
//! Records are appended to fixed-size arenas carved from one anonymous
//! mapping per bucket. The hash index maps a 64-bit key hash to a packed
//! locator; locators are validated against the bucket's write cursor and
//! generation on every lookup, so stale entries read as misses without any
//! eager cleanup.
pub mod arena;
pub mod bucket;
pub mod locator;
pub mod record;

pub use bucket::Bucket;
