//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use protoqa_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Every variable the definition declares must be present in `variables`;
/// extra variables are ignored by the template. Rendering never HTML-escapes,
/// so clinical text keeps its `<`, `>` and quotes.
///
/// # Example
/// ```no_run
/// use protoqa_prompt::{build_prompt, PromptCatalog};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let catalog = PromptCatalog::builtin()?;
/// let mut vars = HashMap::new();
/// vars.insert("text".to_string(), "Flow chart: refer if red flags".to_string());
///
/// let built = build_prompt(catalog.get("figure.summary")?, vars)?;
/// println!("{}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let missing: Vec<&str> = definition
        .variables
        .iter()
        .filter(|name| !variables.contains_key(name.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' is missing variables: {}",
            definition.id,
            missing.join(", ")
        )));
    }

    let rendered = render_template(&definition.template, &variables)?;
    Ok(BuiltPrompt::new(rendered, definition, variables))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
