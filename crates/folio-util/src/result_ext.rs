use std::fmt::Display;

pub trait ResultExt<T, InitialError> {
    /// Map an error to a string-based error variant
    ///
    /// This allows converting `Result<T, InitialError>` to `Result<T, FinalError>` where FinalError has a variant
    /// that takes a String, using the Display implementation of InitialError.
    ///
    /// # Example
    /// ```rust
    /// use folio_util::result_ext::ResultExt;
    ///
    /// #[derive(Debug)]
    /// enum ScanError {
    ///     Parse(String),
    /// }
    ///
    /// fn parse_count(input: &str) -> Result<u32, ScanError> {
    ///     let count = input.parse::<u32>().map_err_str(ScanError::Parse)?;
    ///     Ok(count)
    /// }
    ///
    /// assert!(parse_count("12").is_ok());
    /// assert!(matches!(parse_count("twelve"), Err(ScanError::Parse(_))));
    /// ```
    fn map_err_str<FinalError, F>(self, f: F) -> Result<T, FinalError>
    where
        InitialError: Display,
        F: FnOnce(String) -> FinalError;
}

impl<Type, InitialError> ResultExt<Type, InitialError> for Result<Type, InitialError> {
    fn map_err_str<FinalError, F>(self, f: F) -> Result<Type, FinalError>
    where
        InitialError: Display,
        F: FnOnce(String) -> FinalError,
    {
        self.map_err(|e| f(e.to_string()))
    }
}
