pub mod auth;
pub mod captcha;
pub mod cleanup;
