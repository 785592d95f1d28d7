pub mod claims;
pub mod factory;

pub use claims::{ClaimsError, ClaimsExtractor, SignedClaims};
pub use factory::build_claims_extractor;
