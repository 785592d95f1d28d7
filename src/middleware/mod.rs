/*
 * Responsibility
 * - middleware public interface
 * - captcha::apply(...) for routes that require a solved challenge
 * - http::apply(...) for transport-level layers on the whole app
 */
pub mod captcha;
pub mod http;
