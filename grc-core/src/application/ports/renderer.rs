// grc-core/src/application/ports/renderer.rs

use crate::error::GrcError;

/// Renders narrative text from a template string and a JSON context.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, GrcError>;
}
