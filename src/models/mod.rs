pub mod post;
pub mod subforum;
pub mod user;

pub use post::{PostDetail, PostStatus};
pub use subforum::Subforum;
pub use user::{PublicUser, Role, RoleRecord};
