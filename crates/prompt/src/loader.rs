//! Prompt loader: built-in catalog plus workspace overrides.
//!
//! Every prompt the pipeline needs ships inside the binary. A file
//! `<prompts_dir>/<id>.yml` replaces the built-in definition with the same id.

use crate::builder::build_prompt;
use crate::types::PromptDefinition;
use protoqa_core::{AppError, AppResult};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    ("qa.generate", include_str!("../prompts/qa.generate.yml")),
    ("qa.context", include_str!("../prompts/qa.context.yml")),
    ("figure.summary", include_str!("../prompts/figure.summary.yml")),
    ("table.summary", include_str!("../prompts/table.summary.yml")),
    ("metric.statements", include_str!("../prompts/metric.statements.yml")),
    ("metric.nli", include_str!("../prompts/metric.nli.yml")),
    ("metric.question_gen", include_str!("../prompts/metric.question_gen.yml")),
    ("metric.precision", include_str!("../prompts/metric.precision.yml")),
    ("metric.recall", include_str!("../prompts/metric.recall.yml")),
    ("metric.correctness", include_str!("../prompts/metric.correctness.yml")),
];

/// Ids of the prompts compiled into the binary.
pub fn builtin_ids() -> Vec<&'static str> {
    BUILTIN_PROMPTS.iter().map(|(id, _)| *id).collect()
}

/// Load a prompt definition by ID.
///
/// Looks for `<prompts_dir>/<id>.yml` first, then falls back to the
/// built-in catalog.
pub fn load_prompt(prompts_dir: Option<&Path>, prompt_id: &str) -> AppResult<PromptDefinition> {
    if let Some(dir) = prompts_dir {
        let prompt_file = dir.join(format!("{}.yml", prompt_id));
        if prompt_file.exists() {
            tracing::debug!("Loading prompt override from: {:?}", prompt_file);
            let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to read prompt file {:?}: {}",
                    prompt_file, e
                ))
            })?;
            let definition = parse_prompt(&contents, &prompt_file.display().to_string())?;
            if definition.id != prompt_id {
                return Err(AppError::Prompt(format!(
                    "Prompt file {:?} declares id '{}', expected '{}'",
                    prompt_file, definition.id, prompt_id
                )));
            }
            tracing::info!("Using workspace prompt: {} ({})", definition.id, definition.title);
            return Ok(definition);
        }
    }

    let source = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .map(|(_, source)| *source)
        .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", prompt_id)))?;

    parse_prompt(source, &format!("built-in {}", prompt_id))
}

/// List all available prompt IDs: built-ins plus workspace files.
pub fn list_prompts(prompts_dir: Option<&Path>) -> AppResult<Vec<String>> {
    let mut ids: BTreeSet<String> = builtin_ids().into_iter().map(str::to_string).collect();

    if let Some(dir) = prompts_dir.filter(|d| d.exists()) {
        for entry in walkdir::WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.insert(stem.to_string());
                }
            }
        }
    }

    Ok(ids.into_iter().collect())
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e)))?;
    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt template cannot be empty: {}",
            def.id
        )));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    for variable in &def.variables {
        if !def.template.contains(&format!("{{{{{}}}}}", variable)) {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' declares variable '{}' that its template never uses",
                def.id, variable
            )));
        }
    }

    Ok(())
}

/// All prompts of a run, resolved once.
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    prompts: HashMap<String, PromptDefinition>,
}

impl PromptCatalog {
    /// Built-in prompts only.
    pub fn builtin() -> AppResult<Self> {
        Self::load(None)
    }

    /// Built-in prompts with workspace overrides applied.
    pub fn load(prompts_dir: Option<&Path>) -> AppResult<Self> {
        let mut prompts = HashMap::new();
        for id in builtin_ids() {
            prompts.insert(id.to_string(), load_prompt(prompts_dir, id)?);
        }
        Ok(Self { prompts })
    }

    pub fn get(&self, id: &str) -> AppResult<&PromptDefinition> {
        self.prompts
            .get(id)
            .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", id)))
    }

    /// Render prompt `id` with `(name, value)` pairs.
    pub fn render(&self, id: &str, variables: &[(&str, &str)]) -> AppResult<String> {
        let vars = variables
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok(build_prompt(self.get(id)?, vars)?.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_override(dir: &Path, id: &str, template: &str) {
        fs::create_dir_all(dir).unwrap();
        let content = format!(
            "id: {}\ntitle: Override\napiVersion: \"1.0\"\nvariables: [text]\ntemplate: \"{}\"\noutput:\n  format: text\n",
            id, template
        );
        fs::write(dir.join(format!("{}.yml", id)), content).unwrap();
    }

    #[test]
    fn test_every_builtin_parses() {
        for id in builtin_ids() {
            let def = load_prompt(None, id).unwrap();
            assert_eq!(def.id, id);
            assert!(!def.variables.is_empty(), "{} declares no variables", id);
        }
    }

    #[test]
    fn test_metric_prompts_are_json() {
        let catalog = PromptCatalog::builtin().unwrap();
        for id in builtin_ids().into_iter().filter(|id| id.starts_with("metric.")) {
            assert!(catalog.get(id).unwrap().output.is_json(), "{}", id);
        }
    }

    #[test]
    fn test_render_builtin() {
        let catalog = PromptCatalog::builtin().unwrap();
        let prompt = catalog
            .render(
                "qa.context",
                &[
                    ("source", "Imaging is not indicated."),
                    ("question", "Is imaging indicated?"),
                    ("answer", "No."),
                ],
            )
            .unwrap();
        assert!(prompt.contains("ref_context: Imaging is not indicated."));
        assert!(prompt.contains("Question: Is imaging indicated?"));
    }

    #[test]
    fn test_nli_examples_keep_json() {
        let catalog = PromptCatalog::builtin().unwrap();
        let prompt = catalog
            .render(
                "metric.nli",
                &[("context", "ctx"), ("statements", "statement_1: s")],
            )
            .unwrap();
        assert!(prompt.contains("\"verdict\": \"1\""));
        assert!(prompt.contains("statement_1: s"));
    }

    #[test]
    fn test_workspace_override_wins() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("prompts");
        write_override(&dir, "figure.summary", "Short: {{text}}");

        let catalog = PromptCatalog::load(Some(&dir)).unwrap();
        let prompt = catalog.render("figure.summary", &[("text", "abc")]).unwrap();
        assert_eq!(prompt, "Short: abc");
    }

    #[test]
    fn test_override_with_wrong_id_rejected() {
        let temp = TempDir::new().unwrap();
        write_override(temp.path(), "figure.summary", "{{text}}");
        fs::rename(
            temp.path().join("figure.summary.yml"),
            temp.path().join("table.summary.yml"),
        )
        .unwrap();

        let err = load_prompt(Some(temp.path()), "table.summary").unwrap_err();
        assert!(err.to_string().contains("declares id"));
    }

    #[test]
    fn test_unused_variable_rejected() {
        let temp = TempDir::new().unwrap();
        write_override(temp.path(), "table.summary", "no placeholders");
        assert!(load_prompt(Some(temp.path()), "table.summary").is_err());
    }

    #[test]
    fn test_unknown_prompt() {
        assert!(load_prompt(None, "nonexistent").is_err());
        let catalog = PromptCatalog::builtin().unwrap();
        assert!(catalog.get("nonexistent").is_err());
    }

    #[test]
    fn test_list_prompts_merges_workspace_files() {
        let temp = TempDir::new().unwrap();
        write_override(temp.path(), "custom.extra", "{{text}}");

        let ids = list_prompts(Some(temp.path())).unwrap();
        assert!(ids.contains(&"custom.extra".to_string()));
        assert!(ids.contains(&"qa.generate".to_string()));
        assert_eq!(ids.len(), builtin_ids().len() + 1);
    }
}
