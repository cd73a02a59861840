//! Result type alias for deid-ledger

use super::errors::DeidError;

/// Result type alias for deid-ledger operations
///
/// Uses [`DeidError`] as the error type. Use this throughout the codebase for
/// fallible operations that cross component boundaries.
///
/// # Examples
///
/// ```
/// use deid_ledger::domain::result::Result;
/// use deid_ledger::domain::errors::DeidError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(DeidError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, DeidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(DeidError::Validation("test error".to_string()));
        assert!(result.is_err());
    }
}
