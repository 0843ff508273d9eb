// Client-side session state and route guards, one pair per identity domain

pub mod cache;
pub mod domain;
pub mod error;
pub mod guard;
pub mod storage;
pub mod store;

pub use cache::QueryCache;
pub use domain::{AdminDomain, EndUserDomain, SessionDomain};
pub use error::SessionError;
pub use guard::{GuardDecision, GuardState, RouteGuard};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::{SessionRecord, SessionState, SessionStore};

pub type UserSession = SessionStore<EndUserDomain>;
pub type AdminSession = SessionStore<AdminDomain>;
