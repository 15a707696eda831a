//! Error sanitization for client-facing messages.
//!
//! Prevents leaking internal details (paths, database errors) to clients.

/// Sanitize an error for client consumption.
///
/// Logs the full error server-side, returns a generic message for the client.
pub fn sanitize_error<E: std::fmt::Display>(error: &E, context: &str) -> String {
    tracing::error!(
        error = %error,
        context = context,
        "Internal error occurred"
    );

    format!("An error occurred while {}", context)
}

/// Common error messages for client consumption.
pub mod messages {
    pub const NOT_FOUND: &str = "The requested resource was not found";
    pub const UNAUTHORIZED: &str = "Only the GM can perform this action";
}
