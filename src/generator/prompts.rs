//! Prompt text for the three backend calls.

pub const IDEAS_SYSTEM: &str =
    "You are an expert programming educator who creates engaging technical content ideas.";

pub const ARTICLE_SYSTEM: &str = "You are an expert programming educator and technical writer \
who creates clear, comprehensive, and engaging educational content.";

pub const SIMILARITY_SYSTEM: &str =
    "You are an expert at identifying duplicate or overlapping content topics.";

pub fn ideas_prompt(count: usize, category: &str) -> String {
    format!(
        r#"Generate {count} unique and interesting programming topics for educational content.
Focus on: {category}

For each topic, provide:
1. A concise topic title (3-8 words)
2. A brief description (1-2 sentences)

Return the response as a JSON object with this exact structure:
{{"ideas": [
  {{"topic": "Topic Title", "description": "Brief description of the topic"}}
]}}

Make the topics diverse, covering different skill levels (beginner to advanced) and different areas within {category}.
Focus on practical, actionable topics that would make good tutorial or educational content."#
    )
}

pub fn article_prompt(title: &str, description: &str, word_count: u32) -> String {
    let context = if description.trim().is_empty() {
        String::new()
    } else {
        format!("\n\nContext: {}", description.trim())
    };

    format!(
        r#"Write a comprehensive, educational article about the following programming topic:

Topic: {title}{context}

Requirements:
- Target length: approximately {word_count} words
- Include practical examples and code snippets where appropriate
- Structure the content with clear sections
- Make it engaging and educational for developers
- Include best practices and common pitfalls
- Use markdown formatting for better readability

Provide the response as JSON with this structure:
{{
  "title": "An engaging title for the article",
  "content": "The full article content in markdown format"
}}"#
    )
}

pub fn similarity_prompt(candidate: &str, existing: &[String]) -> String {
    let listing = existing
        .iter()
        .map(|t| format!("- {}", t))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Determine if the following new topic is substantially similar to any of the existing topics.
Consider them similar if they would result in overlapping or redundant content.

New topic: "{candidate}"

Existing topics:
{listing}

Respond with a JSON object:
{{
  "is_similar": true or false,
  "similar_to": "the existing topic it overlaps with, or null",
  "reason": "Brief explanation of your decision"
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ideas_prompt_mentions_count_and_category() {
        let p = ideas_prompt(7, "data structures");
        assert!(p.contains("Generate 7 unique"));
        assert!(p.contains("Focus on: data structures"));
    }

    #[test]
    fn test_article_prompt_context_optional() {
        let with = article_prompt("Borrowing", "Shared vs mutable refs", 800);
        assert!(with.contains("Context: Shared vs mutable refs"));
        assert!(with.contains("approximately 800 words"));

        let without = article_prompt("Borrowing", "  ", 800);
        assert!(!without.contains("Context:"));
    }

    #[test]
    fn test_similarity_prompt_lists_titles() {
        let existing = vec!["Intro to Recursion".to_string(), "Big-O Basics".to_string()];
        let p = similarity_prompt("Recursion for Beginners", &existing);
        assert!(p.contains("New topic: \"Recursion for Beginners\""));
        assert!(p.contains("- Intro to Recursion\n- Big-O Basics"));
    }
}
