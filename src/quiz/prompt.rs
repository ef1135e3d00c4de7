use super::{Category, Difficulty};

/// Category-specific guidance: (subject, requirements, explanation hint, topic hint)
fn category_guidance(category: Category) -> (&'static str, &'static str, &'static str, &'static str) {
    match category {
        Category::Grammar => (
            "grammar",
            "- Include varied sentence structures\n\
             - Focus on practical usage rather than technical terms\n\
             - Incorporate common language patterns",
            "Detailed explanation of why the answer is correct",
            "Specific grammar topic covered",
        ),
        Category::Vocabulary => (
            "vocabulary",
            "- Use words in context-rich situations\n\
             - Include collocations and common word pairs\n\
             - Focus on frequency-based vocabulary selection",
            "Detailed explanation including usage examples",
            "Specific vocabulary theme",
        ),
        Category::CommonPhrases => (
            "expressions",
            "- Include contemporary expressions\n\
             - Focus on situational appropriateness\n\
             - Cover various social contexts",
            "Detailed explanation with cultural context",
            "Specific phrase category or situation",
        ),
    }
}

/// Render the instruction asking the model for one JSON-shaped quiz question
pub fn build_question_prompt(
    user_language: &str,
    target_language: &str,
    category: Category,
    difficulty: Difficulty,
) -> String {
    let (subject, requirements, explanation_hint, topic_hint) = category_guidance(category);

    format!(
        r#"Generate a {difficulty}-level multiple-choice {category} question for language learning.
Context: Question about {target_language} {subject}, written in {user_language}.
Focus Area: {focus}

Constraints for generating unique questions:
- Use diverse question formats (fill-in-blank, scenario-based, translation, etc.)
- Include practical, real-world contexts
- Vary the topics within the category
- Ensure cultural relevance to {target_language}-speaking regions
- Don't repeat common textbook examples

Additional {category} requirements:
{requirements}

Return strictly in this JSON format:
{{
    "question": "Clear, well-formulated question",
    "options": ["Option 1", "Option 2", "Option 3", "Option 4"],
    "correct_answer": "The correct option exactly as written in options",
    "explanation": "{explanation_hint}",
    "difficulty": "{difficulty}",
    "topic": "{topic_hint}"
}}

Provide only the JSON response without any additional text."#,
        focus = difficulty.focus_area(),
    )
}
