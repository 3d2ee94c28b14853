//! Prompt templates for Gist.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    pub question: QuestionPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for summary generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    /// Instruction carrying the target word count (`{{words}}`).
    pub instruction: String,
    /// Full user message (`{{instruction}}`, `{{text}}`).
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            instruction:
                "Provide a summary of the following content in approximately {{words}} words:"
                    .to_string(),
            user: "{{instruction}}\nContent: {{text}}".to_string(),
        }
    }
}

/// Prompts for follow-up question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionPrompts {
    /// Full user message (`{{content}}`, `{{question}}`).
    pub user: String,
}

impl Default for QuestionPrompts {
    fn default() -> Self {
        Self {
            user: r#"Based on the following content, answer the user's question.

Content:
{{content}}

Question:
{{question}}

Answer:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let question_path = custom_path.join("qa.toml");
            if question_path.exists() {
                let content = std::fs::read_to_string(&question_path)?;
                prompts.question = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass over the template, so placeholder-like
    /// text inside substituted values is left as-is. Unknown placeholders are
    /// kept verbatim.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = after[..end].trim();
                    match vars.get(key) {
                        Some(value) => result.push_str(value),
                        None => result.push_str(&rest[start..start + 2 + end + 2]),
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);

        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.summary.instruction.contains("{{words}}"));
        assert!(prompts.question.user.contains("{{question}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_does_not_expand_inside_values() {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), "see {{question}}".to_string());
        vars.insert("question".to_string(), "why?".to_string());

        let result = Prompts::render("{{text}} / {{question}}", &vars);
        assert_eq!(result, "see {{question}} / why?");
    }

    #[test]
    fn test_render_keeps_unknown_and_unterminated() {
        let vars = HashMap::new();
        assert_eq!(Prompts::render("a {{missing}} b", &vars), "a {{missing}} b");
        assert_eq!(Prompts::render("a {{open", &vars), "a {{open");
    }

    #[test]
    fn test_custom_variables_are_overridden() {
        let mut custom = HashMap::new();
        custom.insert("tone".to_string(), "formal".to_string());
        custom.insert("words".to_string(), "1".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("words".to_string(), "300".to_string());
        let result = prompts.render_with_custom("{{tone}} {{words}}", &vars);
        assert_eq!(result, "formal 300");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("summary.toml"),
            "instruction = \"Summarize in {{words}} words as bullet points:\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert!(prompts.summary.instruction.starts_with("Summarize in"));
        // Fields missing from the file keep their defaults
        assert_eq!(prompts.summary.user, SummaryPrompts::default().user);
        assert_eq!(prompts.question.user, QuestionPrompts::default().user);
    }
}
