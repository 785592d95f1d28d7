//! Captcha gate, hook configuration and shutdown barrier for an identity
//! service.
//!
//! - [`middleware::captcha`]: captcha verification with privileged-role bypass
//! - [`config::hooks`]: `functions.hooks` decoding
//! - [`services::cleanup`]: background-work barrier used at shutdown

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
