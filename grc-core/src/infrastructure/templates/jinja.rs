// grc-core/src/infrastructure/templates/jinja.rs

// Turns narrative templates ({{ overall_score | pct }}, {% for gap in gaps %}) into report text.

use minijinja::Environment;

use crate::application::ports::TemplateEngine;
use crate::error::GrcError;
use crate::infrastructure::error::InfrastructureError;

pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl JinjaRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();

        // One decimal, the way scores are quoted in narratives
        env.add_filter("pct", |value: f64| -> String { format!("{:.1}", value) });
        env.add_filter("upper", |value: &str| -> String { value.to_uppercase() });
        env.add_filter("lower", |value: &str| -> String { value.to_lowercase() });

        Self { env }
    }
}

impl Default for JinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for JinjaRenderer {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, GrcError> {
        self.env
            .render_str(template, context)
            .map(|text| text.trim().to_string())
            .map_err(|e| GrcError::Infrastructure(InfrastructureError::TemplateError(e)))
    }
}
