pub mod repository;
pub mod service;

pub use repository::{PgSubforumRepository, SubforumRepository};
pub use service::SubforumService;
