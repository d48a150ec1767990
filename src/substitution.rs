//! `@name` placeholder substitution.
//!
//! Substitution is a plain global text replace per parameter: it does not parse SQL,
//! does not respect word boundaries and does not look inside or around quotes. After
//! all parameters are applied, any `@` left in the text means a placeholder was not
//! supplied.

mod params;
mod renderer;

pub use params::ParameterSet;
pub use renderer::{EscapingRenderer, LiteralRenderer, ParameterRenderer};

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use crate::error::TemplateError;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[A-Za-z_][A-Za-z0-9_]*").expect("placeholder pattern"));

/// Order in which parameter names are replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubstitutionOrder {
    /// Replace in the caller's insertion order. A name that is a prefix of another
    /// (`@id` / `@id2`) replaced first corrupts the longer placeholder.
    #[default]
    AsSupplied,
    /// Replace longer names first (ties keep insertion order), so a prefix name can
    /// never eat into a longer placeholder.
    LongestFirst,
}

/// Applies a [`ParameterRenderer`] to template text.
#[derive(Clone)]
pub struct Substituter {
    renderer: Arc<dyn ParameterRenderer>,
    order: SubstitutionOrder,
}

impl Default for Substituter {
    fn default() -> Self {
        Self::new(Arc::new(LiteralRenderer), SubstitutionOrder::default())
    }
}

impl std::fmt::Debug for Substituter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Substituter")
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl Substituter {
    #[must_use]
    pub fn new(renderer: Arc<dyn ParameterRenderer>, order: SubstitutionOrder) -> Self {
        Self { renderer, order }
    }

    #[must_use]
    pub fn order(&self) -> SubstitutionOrder {
        self.order
    }

    /// Produce the final statement text.
    ///
    /// With no (or empty) parameters the text is passed through untouched and only the
    /// completeness check runs.
    ///
    /// # Errors
    /// Returns `TemplateError::SubstitutionError` if a value cannot be rendered, or
    /// `TemplateError::MissingParameters` if any `@` remains afterwards.
    pub fn substitute(
        &self,
        sql: &str,
        parameters: Option<&ParameterSet>,
    ) -> Result<String, TemplateError> {
        let mut query = sql.to_string();

        if let Some(parameters) = parameters.filter(|p| !p.is_empty()) {
            let mut entries: Vec<_> = parameters.iter().collect();
            if self.order == SubstitutionOrder::LongestFirst {
                entries.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));
            }
            for (name, value) in entries {
                let rendered = self.renderer.render(name, value)?;
                query = query.replace(&format!("@{name}"), &rendered);
            }
        }

        if query.contains('@') {
            return Err(TemplateError::MissingParameters(missing_message(&query)));
        }

        debug!(statement = %query, "substitution complete");
        Ok(query)
    }
}

fn missing_message(query: &str) -> String {
    let mut names: Vec<&str> = Vec::new();
    for m in PLACEHOLDER.find_iter(query) {
        if !names.contains(&m.as_str()) {
            names.push(m.as_str());
        }
    }
    if names.is_empty() {
        "not all parameters were supplied".to_string()
    } else {
        format!(
            "not all parameters were supplied (unresolved: {})",
            names.join(", ")
        )
    }
}
