//! Log redaction helpers.
//!
//! Message bodies never reach log output unless the operator opts in via
//! the `LOG_*_BODY` environment flags. Call sites pass the relevant flag
//! from `Config`.

/// Return the body for logging, or the redaction marker if not opted in.
pub fn body_for_log<'a>(opted_in: bool, body: &'a str) -> &'a str {
    if opted_in {
        body
    } else {
        "REDACTED"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_by_default() {
        assert_eq!(body_for_log(false, "sensitive payload"), "REDACTED");
    }

    #[test]
    fn test_opt_in_passes_through() {
        assert_eq!(body_for_log(true, "sensitive payload"), "sensitive payload");
    }
}
