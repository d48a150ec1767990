use crate::error::TemplateError;
use crate::types::RowValues;

/// Turns one parameter value into the text that replaces its placeholder.
///
/// The engine only ever splices rendered text into the statement, so a stricter
/// renderer can be swapped in without touching the store or the executor.
pub trait ParameterRenderer: Send + Sync {
    /// Render `value`, supplied for placeholder `@name`.
    ///
    /// # Errors
    /// Returns `TemplateError::SubstitutionError` if the value has no literal form.
    fn render(&self, name: &str, value: &RowValues) -> Result<String, TemplateError>;
}

/// Text values are wrapped in single quotes verbatim; embedded quotes are NOT escaped,
/// so untrusted text can rewrite the statement. Numbers, booleans and NULL are written
/// bare.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralRenderer;

impl ParameterRenderer for LiteralRenderer {
    fn render(&self, name: &str, value: &RowValues) -> Result<String, TemplateError> {
        match value {
            RowValues::Text(s) => Ok(format!("'{s}'")),
            RowValues::Int(i) => Ok(i.to_string()),
            RowValues::Float(f) if f.is_finite() => Ok(f.to_string()),
            RowValues::Float(f) => Err(TemplateError::SubstitutionError(format!(
                "parameter '{name}': {f} has no SQL literal form"
            ))),
            RowValues::Bool(b) => Ok(b.to_string()),
            RowValues::Null => Ok("NULL".to_string()),
            RowValues::Timestamp(_) | RowValues::JSON(_) | RowValues::Blob(_) => {
                Err(TemplateError::SubstitutionError(format!(
                    "parameter '{name}': {} values cannot be rendered as a SQL literal",
                    value.type_name()
                )))
            }
        }
    }
}

/// Like [`LiteralRenderer`], but doubles single quotes inside text values.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapingRenderer;

impl ParameterRenderer for EscapingRenderer {
    fn render(&self, name: &str, value: &RowValues) -> Result<String, TemplateError> {
        match value {
            RowValues::Text(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
            other => LiteralRenderer.render(name, other),
        }
    }
}
