pub mod params;
pub mod queries;
pub mod query_builder;
pub mod routes;
pub mod types;

pub use params::{
    AccommodationFilters, ListAccommodationsQuery, SearchAccommodationsQuery, SearchParams,
    SortField, SortOrder,
};
pub use query_builder::{compile, CompiledQuery, SqlArg, Statement};
pub use routes::accommodations_routes;
pub use types::AccommodationItem;
