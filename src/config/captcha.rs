//! `security.captcha` settings and their reload handle.

use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

/// Captcha section as loaded from configuration.
///
/// `provider` stays a raw string: an unknown value is a deployment error the
/// gate reports per request, not a reason to refuse to boot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptchaConfig {
    pub enabled: bool,
    pub provider: String,
    pub secret: String,
}

impl CaptchaConfig {
    pub fn provider_kind(&self) -> Option<CaptchaProviderKind> {
        self.provider.parse().ok()
    }

    /// Secret with surrounding whitespace removed; `None` when nothing is left.
    pub fn secret(&self) -> Option<&str> {
        Some(self.secret.trim()).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptchaProviderKind {
    HCaptcha,
}

impl CaptchaProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HCaptcha => "hcaptcha",
        }
    }
}

impl FromStr for CaptchaProviderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "hcaptcha" => Ok(Self::HCaptcha),
            _ => Err(()),
        }
    }
}

/// Shared, swappable captcha settings.
///
/// Readers take a whole snapshot; `replace` swaps the `Arc` so no reader ever
/// observes a half-updated section.
#[derive(Debug, Clone)]
pub struct CaptchaSettings {
    current: Arc<RwLock<Arc<CaptchaConfig>>>,
}

impl CaptchaSettings {
    pub fn new(config: CaptchaConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    pub fn snapshot(&self) -> Arc<CaptchaConfig> {
        // The lock only guards an Arc swap, a poisoned guard still holds a complete value.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, config: CaptchaConfig) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_resolve() {
        assert_eq!(
            "hcaptcha".parse::<CaptchaProviderKind>(),
            Ok(CaptchaProviderKind::HCaptcha)
        );
        assert!("recaptcha".parse::<CaptchaProviderKind>().is_err());
        assert!("".parse::<CaptchaProviderKind>().is_err());
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let mut config = CaptchaConfig {
            enabled: true,
            provider: "hcaptcha".into(),
            secret: "   ".into(),
        };
        assert_eq!(config.secret(), None);

        config.secret = " 0x00 ".into();
        assert_eq!(config.secret(), Some("0x00"));
    }

    #[test]
    fn replace_is_seen_by_existing_handles() {
        let settings = CaptchaSettings::new(CaptchaConfig::default());
        let other = settings.clone();
        let before = other.snapshot();

        settings.replace(CaptchaConfig {
            enabled: true,
            provider: "hcaptcha".into(),
            secret: "s".into(),
        });

        assert!(!before.enabled);
        assert!(other.snapshot().enabled);
    }
}
