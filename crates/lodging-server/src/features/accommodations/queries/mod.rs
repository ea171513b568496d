pub mod get;
pub mod search;
pub mod stats;

pub use search::SearchAccommodationsResponse;
