//! HTTP request handlers organized by endpoint.

pub mod analyze;
pub mod episodes;
pub mod search;

pub use analyze::analyze;
pub use episodes::list_episodes;
pub use search::search_titles;
