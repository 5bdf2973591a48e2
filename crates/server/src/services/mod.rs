//! Business logic services.
//!
//! Services borrow the store and the auth provider from
//! [`AppState`](crate::state::AppState) for the duration of one request.
//!
//! # Services
//!
//! - `auth` - Signup, sign-in, session checks and sign-out
//! - `products` - Product CRUD
//! - `users` - User administration
//! - `seed` - First-run initialization

pub mod auth;
pub mod products;
pub mod seed;
pub mod users;

pub use auth::{AuthError, AuthService, SignedIn};
pub use products::ProductService;
pub use seed::{InitOutcome, SeedService};
pub use users::UserService;
