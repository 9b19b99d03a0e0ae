//! Profile fetching: URL canonicalization, the upstream scraper client, and
//! normalization into the one canonical profile shape.

mod client;
mod fetch;
pub mod normalize;
pub mod url;

pub use client::RapidApiLinkedIn;
pub use fetch::ProfileFetcher;
