use serde::{Deserialize, Serialize};

/// A prompt sent to the model.
///
/// The stored fields are never rewritten: the body and directives are kept
/// exactly as given, and [`Prompt::render`] assembles the final text on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// The body text
    pub input: String,
    /// Instructions constraining the answer, in order
    #[serde(default)]
    pub directives: Vec<String>,
    /// Optional background material
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Optional word limit for the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Optional description of the expected output format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Prompt {
    /// Creates a prompt with the given body and nothing else.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            directives: Vec::new(),
            context: None,
            max_length: None,
            output: None,
        }
    }

    /// Appends directives after any already present.
    pub fn with_directives<I, S>(mut self, directives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directives.extend(directives.into_iter().map(Into::into));
        self
    }

    /// Sets the context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Sets the word limit.
    pub fn with_max_length(mut self, words: u32) -> Self {
        self.max_length = Some(words);
        self
    }

    /// Sets the output format hint.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Whether the body holds anything besides whitespace.
    pub fn has_body(&self) -> bool {
        !self.input.trim().is_empty()
    }

    /// Renders the text sent to the model.
    pub fn render(&self) -> String {
        let mut sections: Vec<String> = Vec::new();

        if !self.directives.is_empty() {
            let mut block = String::from("Directives:");
            for directive in &self.directives {
                block.push_str("\n- ");
                block.push_str(directive);
            }
            sections.push(block);
        }

        sections.push(self.input.clone());

        if let Some(context) = self.context.as_deref().filter(|c| !c.is_empty()) {
            sections.push(format!("Context: {}", context));
        }

        if let Some(words) = self.max_length {
            sections.push(format!("Please limit your response to {} words.", words));
        }

        if let Some(output) = self.output.as_deref().filter(|o| !o.is_empty()) {
            sections.push(format!("Output format: {}", output));
        }

        sections.join("\n\n")
    }
}
