pub mod cookie;
pub mod extractors;
pub mod services;
pub mod store;

pub use extractors::{CurrentUser, MaybeUser};
pub use services::SessionService;
pub use store::{PgSessionStore, Session, SessionStore};
