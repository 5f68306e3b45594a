//! Prompt builders for the two analysis stages

use crate::bridge::{Perspective, PerspectiveSummary};

/// Prompt extracting the question-relevant aspects of one data perspective
#[must_use]
pub fn perspective_prompt(perspective: &Perspective, question: &str) -> String {
    format!(
        "You are a data analysis extractor assistant.\n\n\
Examine the following data overview and extract the aspects most relevant to \
the user question. If the question focuses on a specific property, object \
type or grouping, focus on that aspect and ignore the rest. If no data is \
relevant, say so. Your feedback will be aggregated with other extracts into a \
final report.\n\n\
# Title and description of the data overview\n\n\
**{title}**: {description}\n\n\
# Data Overview\n\n{content}\n\n\
# User Question\n\n{question}\n",
        title = perspective.title,
        description = perspective.description,
        content = perspective.content,
    )
}

/// Prompt joining per-perspective extracts into one aggregated report
///
/// The report justifies each finding with a `conclusion-reason` fenced block
/// so the render pipeline can attach follow-up actions to it.
#[must_use]
pub fn aggregate_prompt(summaries: &[PerspectiveSummary], question: &str) -> String {
    let perspectives = summaries
        .iter()
        .enumerate()
        .map(|(index, summary)| {
            format!(
                "\n---\n\n# Perspective {number}\n\n**{title}**\n\n{summary}\n",
                number = index + 1,
                title = summary.title,
                summary = summary.summary,
            )
        })
        .collect::<String>();

    format!(
        "You are a data analysis assistant. You are given a set of data \
perspectives extracted from the same dataset for one user question; join them \
into a single, organized report.\n\n\
Instructions:\n\
1. Aggregate the perspectives into one report, merging cross-related ones and \
ignoring irrelevant ones.\n\
2. After stating each finding, restate the key supporting parameters and \
values in plain text, then justify it with a fenced block whose info-string \
is `conclusion-reason`: a short title followed by 3-6 supporting data \
snippets, with parameter names and values wrapped in backticks.\n\
3. If relevant, discuss up to the 4 best and 4 worst examples of data \
quality.\n\
4. Use plain paragraphs and a single level of markdown headings; base the \
report title on the user question, 5 to 7 words. Avoid unfounded speculation \
and closing disclaimers.\n\n\
# User Question\n\n{question}\n\n\
# Data Perspectives\n{perspectives}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perspective_prompt_carries_all_fields() {
        let prompt = perspective_prompt(
            &Perspective {
                title: "Property usage".to_string(),
                description: "How often each property is set".to_string(),
                content: "LoadBearing: 201".to_string(),
            },
            "Which properties are underused?",
        );
        assert!(prompt.contains("**Property usage**"));
        assert!(prompt.contains("LoadBearing: 201"));
        assert!(prompt.contains("Which properties are underused?"));
    }

    #[test]
    fn aggregate_prompt_numbers_perspectives() {
        let summaries = vec![
            PerspectiveSummary {
                title: "A".to_string(),
                summary: "first".to_string(),
            },
            PerspectiveSummary {
                title: "B".to_string(),
                summary: "second".to_string(),
            },
        ];
        let prompt = aggregate_prompt(&summaries, "q");
        assert!(prompt.contains("# Perspective 1"));
        assert!(prompt.contains("# Perspective 2"));
        assert!(prompt.contains("conclusion-reason"));
    }
}
