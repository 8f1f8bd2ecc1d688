//! Prompt assembly for the completion call.

use super::types::{AgentRequest, QueryType, RetrievedChunk};

/// Renders retrieved chunks (or, for user-context requests with nothing
/// retrieved, the caller's own context) into the block the model is told to
/// answer from. Empty when there is nothing to ground on.
pub fn build_context_text(request: &AgentRequest, chunks: &[RetrievedChunk]) -> String {
    if !chunks.is_empty() {
        return chunks
            .iter()
            .map(|chunk| format!("Source: {}\nContent: {}", chunk.source_url, chunk.content))
            .collect::<Vec<_>>()
            .join("\n\n");
    }

    match (request.query_type, request.user_context_text()) {
        (QueryType::UserContext, Some(user_context)) => format!("User Context: {}", user_context),
        _ => String::new(),
    }
}

pub fn build_prompt(query: &str, context_text: &str) -> String {
    if context_text.is_empty() {
        return format!(
            "You are an AI assistant for the AI Robotics textbook.\n\
             The system couldn't find relevant context for the question: {query}\n\
             Provide a general response based on your knowledge while noting that specific \
             textbook content wasn't available."
        );
    }

    format!(
        "You are an AI assistant for the AI Robotics textbook. Answer the user's question \
         based on the provided context.\n\
         \n\
         Context:\n\
         {context_text}\n\
         \n\
         Question: {query}\n\
         \n\
         Instructions:\n\
         - Answer based on the context provided\n\
         - If the context doesn't contain the answer, say so\n\
         - Provide source attribution when possible\n\
         - Be concise and accurate\n\
         - Never hallucinate information not in the context"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn chunk(url: &str, content: &str) -> RetrievedChunk {
        RetrievedChunk {
            id: format!("{}#0", url),
            content: content.to_string(),
            source_url: url.to_string(),
            chapter: None,
            section: None,
            similarity_score: 0.8,
            confidence_score: 0.8,
            retrieval_timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn chunks_are_joined_with_blank_lines() {
        let request = AgentRequest::new("What is ROS?");
        let chunks = vec![chunk("u1", "first"), chunk("u2", "second")];

        let context = build_context_text(&request, &chunks);

        assert_eq!(context, "Source: u1\nContent: first\n\nSource: u2\nContent: second");
    }

    #[test]
    fn user_context_is_used_only_without_chunks() {
        let request = AgentRequest::new("Summarise")
            .with_query_type(QueryType::UserContext)
            .with_user_context("chapter 1 notes");

        assert_eq!(build_context_text(&request, &[]), "User Context: chapter 1 notes");
        assert_eq!(
            build_context_text(&request, &[chunk("u1", "body")]),
            "Source: u1\nContent: body"
        );
    }

    #[test]
    fn user_context_is_ignored_for_general_queries() {
        let request = AgentRequest::new("q").with_user_context("notes");
        assert_eq!(build_context_text(&request, &[]), "");
    }

    #[test]
    fn grounded_prompt_carries_context_and_rules() {
        let prompt = build_prompt("What is SLAM?", "Source: u1\nContent: SLAM is ...");

        assert!(prompt.contains("Context:\nSource: u1\nContent: SLAM is ..."));
        assert!(prompt.contains("Question: What is SLAM?"));
        assert!(prompt.contains("If the context doesn't contain the answer, say so"));
        assert!(prompt.contains("Never hallucinate"));
    }

    #[test]
    fn fallback_prompt_discloses_missing_context() {
        let prompt = build_prompt("What is this book about?", "");

        assert!(prompt.contains("couldn't find relevant context"));
        assert!(prompt.contains("What is this book about?"));
        assert!(!prompt.contains("Context:"));
    }
}
