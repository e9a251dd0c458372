pub mod access_jwt;
pub mod factory;
pub mod gate;
pub mod role;

pub use access_jwt::{AccessJwtError, AuthService, TokenVerifier, VerifiedAccessToken};
pub use factory::build_auth_service;
pub use gate::{AuthError, Identity, IdentityLookup, authenticate};
pub use role::Role;
