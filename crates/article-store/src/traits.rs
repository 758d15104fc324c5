use std::error::Error as StdError;

/// A storage location holding at most one persisted document.
///
/// Every backend implements this trait. The store does not interpret the
/// bytes: versioning and migration are handled by
/// [`article-migrate`](https://docs.rs/article-migrate).
///
/// Implementations must make [`replace`](Self::replace) all-or-nothing: after
/// a failed call the previous content is still in place.
pub trait DocumentStore {
    /// Error type for this backend.
    type Error: StdError + Send + Sync + 'static;

    /// Human-readable location, used in logs and error messages.
    fn location(&self) -> String;

    /// Read the whole document.
    /// Returns `None` if nothing is stored at this location.
    fn load(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Replace the stored document with `contents` in a single step.
    fn replace(&mut self, contents: &[u8]) -> Result<(), Self::Error>;

    /// Check if a document exists at this location.
    fn exists(&self) -> Result<bool, Self::Error> {
        Ok(self.load()?.is_some())
    }
}
