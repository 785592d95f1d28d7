/// Provider lookup by configured kind.
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{CaptchaProviderKind, Config};
use crate::services::captcha::{CaptchaError, CaptchaProvider, HCaptchaProvider};

#[derive(Clone, Default)]
pub struct CaptchaProviders {
    providers: HashMap<CaptchaProviderKind, Arc<dyn CaptchaProvider>>,
}

impl std::fmt::Debug for CaptchaProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(self.providers.values().map(|p| p.name()))
            .finish()
    }
}

impl CaptchaProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in provider, pointed at the configured endpoint.
    pub fn from_config(config: &Config) -> Result<Self, CaptchaError> {
        let hcaptcha =
            HCaptchaProvider::new(config.captcha_verify_url.clone(), config.captcha_timeout)?;

        Ok(Self::new().with(CaptchaProviderKind::HCaptcha, Arc::new(hcaptcha)))
    }

    pub fn with(mut self, kind: CaptchaProviderKind, provider: Arc<dyn CaptchaProvider>) -> Self {
        self.providers.insert(kind, provider);
        self
    }

    pub fn get(&self, kind: CaptchaProviderKind) -> Option<&Arc<dyn CaptchaProvider>> {
        self.providers.get(&kind)
    }
}
