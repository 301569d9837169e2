//! Prompt templating for the rerank and final-answer LLM calls.
//!
//! Pure string construction: no network, no state, deterministic for
//! identical inputs. Candidate metadata iterates in insertion order.

use crate::domain::models::Candidate;

/// Fields never shown to the model in the answer prompt.
const ANSWER_SKIP_FIELDS: &[&str] = &["id", "distance", "is_annotated"];

/// Fields never shown to the model in the rerank prompt.
const RERANK_SKIP_FIELDS: &[&str] = &["id", "distance"];

/// Build the final-answer prompt.
///
/// Enumerates the candidates and demands a JSON object with exactly
/// `recommended_index` and `answer_text`, grounded only in the listed
/// candidates.
pub fn answer_prompt(
    instruction: &str,
    candidates: &[Candidate],
    query_image: Option<&str>,
    query_text: Option<&str>,
) -> String {
    let query_section = user_query_section(instruction, query_image, query_text);

    let mut context_section = String::from("--- Retrieved Relevant Products ---\n");
    if candidates.is_empty() {
        context_section.push_str("No relevant products found.\n");
    } else {
        push_candidate_listing(&mut context_section, "Product", candidates, ANSWER_SKIP_FIELDS);
    }

    let final_instruction = "--- Task Instruction ---\n\
        You are a professional shopping assistant. Your task is to answer the user's query based ONLY on the [Retrieved Relevant Products].\n\
        **CRITICAL RULES:**\n\
        1. Your response MUST be in JSON format.\n\
        2. The JSON object must have two keys: `recommended_index` and `answer_text`.\n\
        3. `recommended_index`: The integer index of the product you are primarily recommending. If no single product is a good fit, use `null`.\n\
        4. `answer_text`: A helpful, natural language text for the user. In this text, explain WHY the product is a good match, citing its details. If no product is a good match, honestly explain why.\n\
        5. Your `answer_text` MUST be based strictly on the provided product information. DO NOT use external knowledge.\n\
        Your JSON response is:";

    format!("{query_section}\n{context_section}\n{final_instruction}")
}

/// Build the rerank prompt.
///
/// Enumerates the candidates and demands a JSON object whose single
/// `reranked_indices` key lists the input indices, most relevant first.
pub fn rerank_prompt(
    instruction: &str,
    candidates: &[Candidate],
    query_image: Option<&str>,
    query_text: Option<&str>,
) -> String {
    let query_section = user_query_section(instruction, query_image, query_text);

    let mut context_section = String::from("--- Retrieved Candidates for Reranking ---\n");
    if candidates.is_empty() {
        context_section.push_str("No candidates found.\n");
    } else {
        push_candidate_listing(&mut context_section, "Candidate", candidates, RERANK_SKIP_FIELDS);
    }

    let final_instruction = "--- Task Instruction ---\n\
        You are an expert relevance judge. Your task is to evaluate the relevance of each candidate product to the user's query.\n\
        Based on the query and the candidate list, sort the candidates from most relevant to least relevant.\n\
        You MUST return a JSON object with a single key 'reranked_indices', which must be a list of integers. \
        Each integer corresponds to the original index of a candidate.\n\
        For example, if you think Candidate 2 is most relevant, followed by Candidate 0, your response should be: {\"reranked_indices\": [2, 0, ...]}\n\
        Your JSON response is:";

    format!("{query_section}\n{context_section}\n{final_instruction}")
}

fn user_query_section(
    instruction: &str,
    query_image: Option<&str>,
    query_text: Option<&str>,
) -> String {
    let mut section = String::from("--- User Query ---\n");
    if let Some(text) = query_text {
        section.push_str(&format!("Query Text: \"{text}\"\n"));
    }
    if query_image.is_some() {
        section.push_str("Query Image: (User provided an image for reference)\n");
    }
    section.push_str(&format!("User's specific instruction is: \"{instruction}\"\n"));
    section
}

fn push_candidate_listing(
    out: &mut String,
    label: &str,
    candidates: &[Candidate],
    skip_fields: &[&str],
) {
    for (index, candidate) in candidates.iter().enumerate() {
        out.push_str(&format!("{label} {index}:\n"));
        for (key, value) in &candidate.fields {
            if skip_fields.contains(&key.as_str()) {
                continue;
            }
            out.push_str(&format!("  - {}: {}\n", capitalize(key), render_value(value)));
        }
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Strings render unquoted; everything else as compact JSON.
fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
