// Prompt template for every question answered from CV context.

use crate::llm_client::prompts::GROUNDING_INSTRUCTION;

const ANALYSIS_GUIDELINES: &str = "\
Guidelines for analysis:
- Focus on relevant skills, experience, and qualifications
- Consider both technical capabilities and soft skills
- Evaluate experience levels and role relevance
- Identify key achievements and unique qualifications
- Maintain professional HR terminology
- Be objective and specific in assessments";

/// Prefix used for explorer retrieval so the query embeds close to
/// collection-wide questions.
pub const EXPLORER_QUERY_PREFIX: &str = "Analyze all available CVs and answer: ";

pub const INTERVIEW_SUGGESTIONS: &[&str] = &[
    "What are their key skills?",
    "Compare their experience levels.",
    "Who has the most relevant background?",
    "Rate their technical expertise.",
];

pub const EXPLORER_SUGGESTIONS: &[&str] = &[
    "List all candidates names with Machine Learning experience",
    "Who has the most years of experience?",
    "Summarize each CV in bullet points",
];

/// Builds the single user prompt: guidelines, CV context, the question, then
/// the grounding instruction.
pub fn build_prompt(context: &str, question: &str) -> String {
    let context = if context.trim().is_empty() {
        "(no CV excerpts matched this question)"
    } else {
        context.trim()
    };

    format!(
        "Analyze the following CV information carefully and provide a detailed response.

{ANALYSIS_GUIDELINES}

Context from CVs:
{context}

Question: {question}

{GROUNDING_INSTRUCTION}

Detailed professional analysis:"
    )
}
