pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod utils;

pub use claims::{Actor, Claims};
pub use jwt::JwtService;
pub use middleware::{AuthMiddleware, AuthenticatedUser};
pub use utils::{actor_from_context, extract_claims_from_context, require_owner_or_admin};
