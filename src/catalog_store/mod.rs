mod criteria;
mod models;
mod query;
mod schema;
mod store;
mod trait_def;

pub use criteria::{
    clamp_limit, clamp_offset, normalize_text, parse_id_list, FilterCriteria, SortKey, SortOrder,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use models::{Album, AlbumType, Artist, AudioFeatures, Collaborator, Track};
pub use query::QueryBuilder;
pub use schema::CATALOG_VERSIONED_SCHEMAS;
pub use store::SqliteCatalogStore;
pub use trait_def::CatalogStore;
