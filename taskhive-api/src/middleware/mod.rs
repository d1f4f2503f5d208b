/// HTTP middleware
///
/// - `security`: OWASP security headers applied to every response
///
/// JWT authentication is wired as a per-router layer in `app.rs`.
pub mod security;
