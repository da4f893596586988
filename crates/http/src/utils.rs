//! Internal helper macros.

/// Returns early with `$error` unless `$predicate` holds.
///
/// Like `assert!`, but for validation paths that report an error instead of panicking.
///
/// ```ignore
/// ensure!(consumed <= MAX_HEADER_BYTES, ParseError::too_large_header(consumed, MAX_HEADER_BYTES));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
