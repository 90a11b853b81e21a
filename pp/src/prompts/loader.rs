//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::PathBuf;

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::domain::DiagnoseContext;

/// Context for rendering the diagnose user prompt
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosePromptContext {
    /// Free-text symptoms, as submitted
    pub symptoms: String,
    /// Is pool context available?
    pub has_context: bool,
    /// Pool context as pretty-printed JSON (empty when absent)
    pub context_json: String,
}

impl DiagnosePromptContext {
    pub fn new(symptoms: &str, context: Option<&DiagnoseContext>) -> Self {
        debug!(symptoms_len = symptoms.len(), has_context = context.is_some(), "DiagnosePromptContext::new: called");
        let context_json = context.and_then(|c| serde_json::to_string_pretty(c).ok());
        Self {
            symptoms: symptoms.to_string(),
            has_context: context_json.is_some(),
            context_json: context_json.unwrap_or_default(),
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Operator override directory (`llm.prompts-dir`)
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a new prompt loader with an optional override directory
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        debug!(?override_dir, "PromptLoader::new: called");
        let override_dir = match override_dir {
            Some(dir) if dir.is_dir() => {
                debug!("PromptLoader::new: override directory found");
                Some(dir)
            }
            Some(dir) => {
                tracing::warn!("Prompt directory {} does not exist, using embedded prompts", dir.display());
                None
            }
            None => {
                debug!("PromptLoader::new: no override directory");
                None
            }
        };

        Self {
            hbs: Self::engine(),
            override_dir,
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    // Prompts are plain text, not HTML
    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks the override directory first, then the embedded defaults.
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in override directory");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            } else {
                debug!(?path, "PromptLoader::load_template: not found in override directory");
            }
        }

        debug!("PromptLoader::load_template: trying embedded fallback");
        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// The diagnose system prompt
    pub fn diagnose_system(&self) -> Result<String> {
        debug!("PromptLoader::diagnose_system: called");
        self.load_template("diagnose-system")
    }

    /// The diagnose user prompt rendered for one request
    pub fn diagnose_user(&self, context: &DiagnosePromptContext) -> Result<String> {
        debug!("PromptLoader::diagnose_user: called");
        self.render("diagnose-user", context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> DiagnoseContext {
        serde_json::from_str(r#"{"poolVolumeGallons": 15000, "latestTest": {"fc": 1.0, "ph": 7.8}}"#).unwrap()
    }

    #[test]
    fn test_prompt_context_without_pool_context() {
        let ctx = DiagnosePromptContext::new("cloudy water", None);
        assert!(!ctx.has_context);
        assert!(ctx.context_json.is_empty());
    }

    #[test]
    fn test_render_user_prompt_with_context() {
        let loader = PromptLoader::embedded_only();
        let ctx = DiagnosePromptContext::new("green & cloudy \"bad\"", Some(&context()));
        let rendered = loader.diagnose_user(&ctx).unwrap();

        // No HTML escaping of quotes or ampersands
        assert!(rendered.contains("green & cloudy \"bad\""));
        assert!(rendered.contains("\"poolVolumeGallons\": 15000"));
        assert!(!rendered.contains("No pool context"));
    }

    #[test]
    fn test_render_user_prompt_without_context() {
        let loader = PromptLoader::embedded_only();
        let rendered = loader.diagnose_user(&DiagnosePromptContext::new("cloudy", None)).unwrap();
        assert!(rendered.contains("cloudy"));
        assert!(rendered.contains("No pool context"));
    }

    #[test]
    fn test_override_directory_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("diagnose-system.pmt"), "custom system prompt").unwrap();

        let loader = PromptLoader::new(Some(dir.path().to_path_buf()));
        assert_eq!(loader.diagnose_system().unwrap(), "custom system prompt");

        // Templates missing from the override dir still come from the binary
        let rendered = loader.diagnose_user(&DiagnosePromptContext::new("x", None)).unwrap();
        assert!(rendered.contains("Symptoms"));
    }

    #[test]
    fn test_missing_override_directory_uses_embedded() {
        let loader = PromptLoader::new(Some(PathBuf::from("/nonexistent/prompts")));
        assert!(loader.diagnose_system().unwrap().contains("PoolPro"));
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
    }
}
