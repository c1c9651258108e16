//! Result type alias for Nimbus

use super::errors::NimbusError;

/// Result type alias for Nimbus operations
///
/// # Examples
///
/// ```
/// use nimbus::domain::result::Result;
/// use nimbus::domain::errors::NimbusError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(NimbusError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, NimbusError>;
