//! Summary generation and follow-up question answering.

use crate::config::Prompts;
use crate::content::ContentDocument;
use crate::error::Result;
use crate::llm::LanguageModel;
use std::collections::HashMap;
use tracing::{info, instrument};

/// Builds prompts from the configured templates and sends them to a model.
#[derive(Debug, Clone, Default)]
pub struct Summarizer {
    prompts: Prompts,
}

impl Summarizer {
    pub fn new(prompts: Prompts) -> Self {
        Self { prompts }
    }

    /// The instruction naming the target summary length.
    pub fn instruction(&self, words: u32) -> String {
        let mut vars = HashMap::new();
        vars.insert("words".to_string(), words.to_string());
        self.prompts
            .render_with_custom(&self.prompts.summary.instruction, &vars)
    }

    /// Full summarization prompt for a document.
    pub fn summary_prompt(&self, document: &ContentDocument, words: u32) -> String {
        let mut vars = HashMap::new();
        vars.insert("instruction".to_string(), self.instruction(words));
        vars.insert("words".to_string(), words.to_string());
        vars.insert("text".to_string(), document.text.clone());
        self.prompts
            .render_with_custom(&self.prompts.summary.user, &vars)
    }

    /// Prompt asking a question about the document.
    pub fn question_prompt(&self, document: &ContentDocument, question: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("content".to_string(), document.text.clone());
        vars.insert("question".to_string(), question.to_string());
        self.prompts
            .render_with_custom(&self.prompts.question.user, &vars)
    }

    /// Summarize a document to roughly `words` words.
    #[instrument(skip(self, model, document), fields(model = %model.name(), words = words))]
    pub async fn summarize(
        &self,
        model: &dyn LanguageModel,
        document: &ContentDocument,
        words: u32,
    ) -> Result<String> {
        info!("Summarizing {} words of content", document.word_count());
        model.complete(&self.summary_prompt(document, words)).await
    }

    /// Answer a question from the document alone.
    #[instrument(skip(self, model, document), fields(model = %model.name()))]
    pub async fn answer(
        &self,
        model: &dyn LanguageModel,
        document: &ContentDocument,
        question: &str,
    ) -> Result<String> {
        model.complete(&self.question_prompt(document, question)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::SourceKind;
    use crate::error::GistError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingModel {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("reply".to_string())
        }
    }

    fn document(text: &str) -> ContentDocument {
        ContentDocument {
            text: text.to_string(),
            source_url: "https://example.com".to_string(),
            kind: SourceKind::Web,
            title: None,
        }
    }

    #[test]
    fn test_instruction_embeds_word_count() {
        let summarizer = Summarizer::default();
        let five_hundred = summarizer.instruction(500);
        assert!(five_hundred.contains("500"));
        assert_eq!(
            five_hundred,
            "Provide a summary of the following content in approximately 500 words:"
        );

        let three_fifty = summarizer.instruction(350);
        assert_eq!(three_fifty, five_hundred.replace("500", "350"));
    }

    #[test]
    fn test_summary_prompt_layout() {
        let prompt = Summarizer::default().summary_prompt(&document("The body."), 200);
        assert_eq!(
            prompt,
            "Provide a summary of the following content in approximately 200 words:\nContent: The body."
        );
    }

    #[test]
    fn test_question_prompt_layout() {
        let prompt = Summarizer::default().question_prompt(&document("Cats sleep a lot."), "Do cats sleep?");
        assert!(prompt.starts_with("Based on the following content, answer the user's question."));
        assert!(prompt.contains("Content:\nCats sleep a lot.\n\nQuestion:\nDo cats sleep?\n\nAnswer:"));
    }

    #[test]
    fn test_document_text_is_not_treated_as_template() {
        let prompt = Summarizer::default().question_prompt(&document("Use {{question}} here"), "Q");
        assert!(prompt.contains("Use {{question}} here"));
    }

    #[tokio::test]
    async fn test_summarize_and_answer_use_model() {
        let model = RecordingModel {
            prompts: Mutex::new(Vec::new()),
        };
        let summarizer = Summarizer::default();
        let doc = document("Some text");

        assert_eq!(summarizer.summarize(&model, &doc, 100).await.unwrap(), "reply");
        assert_eq!(summarizer.answer(&model, &doc, "What?").await.unwrap(), "reply");

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("approximately 100 words"));
        assert!(prompts[1].contains("What?"));
    }

    #[tokio::test]
    async fn test_model_errors_propagate() {
        struct FailingModel;

        #[async_trait]
        impl LanguageModel for FailingModel {
            fn name(&self) -> &str {
                "failing"
            }

            async fn complete(&self, _prompt: &str) -> Result<String> {
                Err(GistError::Llm("rate limited".to_string()))
            }
        }

        let err = Summarizer::default()
            .summarize(&FailingModel, &document("x"), 100)
            .await
            .unwrap_err();
        assert!(matches!(err, GistError::Llm(_)));
    }
}
