pub mod hcaptcha;
pub mod provider;
pub mod registry;

pub use hcaptcha::HCaptchaProvider;
pub use provider::{CaptchaError, CaptchaProvider, CaptchaResult, Verification};
pub use registry::CaptchaProviders;
