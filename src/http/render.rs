//! Template rendering collaborator.

use serde_json::Value;

pub type RenderError = Box<dyn std::error::Error + Send + Sync>;

/// Renders a named template with the given data.
///
/// The application only delegates to this trait; template syntax, loading
/// and caching belong to the implementation.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, name: &str, data: &Value) -> Result<Vec<u8>, RenderError>;
}
