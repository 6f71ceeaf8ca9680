/// Middleware modules for the API server
///
/// Authentication middleware lives in `bugboard_shared::auth::middleware`
/// so other binaries can reuse it; this module holds layers specific to
/// the HTTP server.

pub mod security;
