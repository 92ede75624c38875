//! Maps service and pipeline errors to wxdash_core::AppError for consistent user-facing messages.
//! Each error source has its own module to keep mappings small and readable.

mod auth;
mod weather;

use wxdash_core::AppError;

/// Conversion into `AppError` for error types defined in other crates.
pub trait AppErrorExt {
    fn into_app_error(self) -> AppError;
}
