/// Factory: build `ClaimsExtractor` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::ClaimsExtractor;

pub fn build_claims_extractor(config: &Config) -> Arc<ClaimsExtractor> {
    Arc::new(ClaimsExtractor::from_config(&config.jwt))
}
