use serde_json::{Map, Value};

use crate::chain::{MigrationError, MigrationStep};
use crate::schema::Schema;

/// A [`MigrationStep`] built from a pure function between two typed shapes.
///
/// The body is decoded into `F`, passed through the function, and encoded
/// from `T`. Source and target versions come from the shapes themselves.
///
/// # Example
///
/// ```
/// use article_migrate::{BodyV3, BodyV4, ArticleList, MigrationStep, TypedStep};
///
/// fn wrap(old: BodyV3) -> BodyV4 {
///     BodyV4 { articles: ArticleList { list: old.articles }, extra: old.extra }
/// }
///
/// let step = TypedStep::new("wrap", wrap);
/// assert_eq!(step.source_version(), 3);
/// assert_eq!(step.target_version(), 4);
/// ```
pub struct TypedStep<F, T> {
    description: &'static str,
    transform: fn(F) -> T,
}

impl<F: Schema, T: Schema> TypedStep<F, T> {
    /// Wrap `transform` as a step.
    pub fn new(description: &'static str, transform: fn(F) -> T) -> Self {
        Self {
            description,
            transform,
        }
    }

    /// Wrap `transform` and box it for registration.
    pub fn boxed(description: &'static str, transform: fn(F) -> T) -> Box<dyn MigrationStep>
    where
        F: 'static,
        T: 'static,
    {
        Box::new(Self::new(description, transform))
    }
}

impl<F: Schema, T: Schema> MigrationStep for TypedStep<F, T> {
    fn source_version(&self) -> u32 {
        F::VERSION
    }

    fn target_version(&self) -> u32 {
        T::VERSION
    }

    fn description(&self) -> &str {
        self.description
    }

    fn apply(&self, body: Map<String, Value>) -> Result<Map<String, Value>, MigrationError> {
        let old: F = serde_json::from_value(Value::Object(body)).map_err(|e| {
            MigrationError::Malformed(format!("body does not match the v{} shape: {e}", F::VERSION))
        })?;

        match serde_json::to_value((self.transform)(old)) {
            Ok(Value::Object(body)) => Ok(body),
            Ok(_) => Err(MigrationError::Serialization(format!(
                "v{} body did not serialize to an object",
                T::VERSION
            ))),
            Err(e) => Err(MigrationError::Serialization(e.to_string())),
        }
    }
}
