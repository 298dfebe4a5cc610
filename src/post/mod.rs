pub mod repository;
pub mod service;

pub use repository::{PgPostRepository, PostRepository};
pub use service::PostService;
