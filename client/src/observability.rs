//! # Observability
//!
//! Each client call opens an `api_client` span and carries a `Logger` accumulating
//! the identifiers it was called with. Failures are logged once, with that context,
//! right before they are returned.

use crate::error::ClientError;
use tracing::Span;

/// Key/value context attached to client log lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Logger {
    name: String,
    values: Vec<(&'static str, String)>,
}

impl Logger {
    /// A logger tagged with `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// The logger with one more key/value pair.
    pub fn with_value(mut self, key: &'static str, value: impl ToString) -> Self {
        self.values.push((key, value.to_string()));
        self
    }

    /// Accumulated pairs, in insertion order.
    pub fn values(&self) -> &[(&'static str, String)] {
        &self.values
    }

    fn rendered_values(&self) -> String {
        self.values
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Logs `err` at error level.
    pub fn error(&self, err: &ClientError, description: &str) {
        tracing::error!(
            logger = %self.name,
            values = %self.rendered_values(),
            error = %err,
            "{}",
            description
        );
    }
}

/// Opens the span of one client call.
pub fn start_span(operation: &str) -> Span {
    tracing::info_span!("api_client", operation = operation)
}

/// Adds the failing step to `err`, logs it inside `span` and hands it back.
pub fn prepare_and_log_error(
    err: ClientError,
    logger: &Logger,
    span: &Span,
    description: &str,
) -> ClientError {
    let err = err.with_context(description);
    span.in_scope(|| logger.error(&err, description));
    err
}

/// Span attribute helpers.
pub mod spans {
    use tracing::Span;

    /// Records an identifier on the span under its observability key.
    pub fn attach_to_span(span: &Span, key: &'static str, value: &str) {
        tracing::trace!(parent: span, attribute.key = key, attribute.value = value, "span attribute");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_accumulates_values() {
        let logger = Logger::new("larder_client")
            .with_value("meal_plan.id", "p1")
            .with_value("meal_plan_event.id", "e1");
        assert_eq!(
            logger.values(),
            &[
                ("meal_plan.id", "p1".to_string()),
                ("meal_plan_event.id", "e1".to_string())
            ]
        );
        assert_eq!(logger.rendered_values(), "meal_plan.id=p1 meal_plan_event.id=e1");
    }

    #[test]
    fn test_prepare_and_log_error_sets_context() {
        let span = start_span("GetMealPlan");
        let err = prepare_and_log_error(
            ClientError::build("relative URL without a base"),
            &Logger::default(),
            &span,
            "building request to fetch MealPlan",
        );
        assert_eq!(
            err,
            ClientError::BuildRequestFailed {
                context: "building request to fetch MealPlan".into(),
                message: "relative URL without a base".into(),
            }
        );
    }
}
