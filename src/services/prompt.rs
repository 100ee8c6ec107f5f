//! Rewrite prompt construction.

use crate::domain::models::TransformationKind;
use crate::domain::ports::ReferencePattern;

/// Patterns beyond this many are ignored to bound prompt size.
pub const MAX_PROMPT_PATTERNS: usize = 3;

/// Inputs for one rewrite prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub kind: TransformationKind,
    pub file_path: &'a str,
    pub language: &'a str,
    pub code: &'a str,
    pub patterns: &'a [ReferencePattern],
}

/// Build the prompt sent to the AI backend.
///
/// The output-format section pins the `SUMMARY:` line and fenced code block
/// that [`crate::services::response_parser`] expects.
pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let PromptInput {
        kind,
        file_path,
        language,
        code,
        patterns,
    } = *input;

    let mut prompt = String::with_capacity(code.len() + 1024);
    prompt.push_str(&format!(
        "You are an expert {language} developer improving code quality.\n\n\
         TASK: {directive}\n\
         FILE PATH: {file_path}\n\
         LANGUAGE: {language}\n\n\
         ORIGINAL CODE:\n\
         ```{language}\n\
         {code}\n\
         ```\n",
        directive = kind.directive(),
    ));

    if !patterns.is_empty() {
        prompt.push_str("\nRELEVANT PATTERNS:\n");
        for (i, pattern) in patterns.iter().take(MAX_PROMPT_PATTERNS).enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, pattern.description));
            if let Some(example) = &pattern.example {
                prompt.push_str(&format!("   Example: {example}\n"));
            }
        }
    }

    prompt.push_str(&format!(
        "\nINSTRUCTIONS:\n\
         1. Read the code carefully before changing it\n\
         2. Apply the requested transformation: {kind}\n\
         3. Preserve the externally observable behavior\n\
         4. Keep the overall structure unless the transformation requires otherwise\n\
         5. Return the complete file, not a diff\n\n\
         OUTPUT FORMAT:\n\
         Start with a single line beginning with \"SUMMARY:\" describing the change.\n\
         Then give the complete transformed code in one fenced block tagged with the language:\n\n\
         SUMMARY: <one line>\n\
         ```{language}\n\
         <transformed code>\n\
         ```\n",
        kind = kind.as_str(),
    ));

    prompt
}
