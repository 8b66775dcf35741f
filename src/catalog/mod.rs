//! Catalog normalization: requests in, tagged catalog records out.

pub mod layout;
pub mod normalizer;
pub mod request;

pub use layout::{discover_episodes, EpisodeFile};
pub use normalizer::{mean_rating, CatalogNormalizer, Normalized};
pub use request::IngestRequest;
