//! Domain input types with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod avatar;
pub mod body;
pub mod pagination;
pub mod user;
pub mod validation;

pub use avatar::{avatar_hash, gravatar_url};
pub use body::Body;
pub use pagination::{last_page, CommentPageParams, Paginated, Pagination, PaginationParams};
pub use user::{Email, NewPassword, ProfileField, Username};
pub use validation::ValidationError;
