//! Generative assistant: LLM reranking and final answer synthesis.
//!
//! This is the one layer that treats model output as untrusted free
//! text. Every parse step degrades to a safe default instead of
//! erroring, because the serving loop above has no recovery path of
//! its own.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Answer, Candidate};
use crate::domain::ports::{GenerateOptions, Generator};
use crate::services::json_extract::extract_json_object;
use crate::services::prompts::{answer_prompt, rerank_prompt};

/// Reranked candidates forwarded to final answer generation.
pub const DEFAULT_RERANK_TOP_K: usize = 3;

const NO_RESULTS_MESSAGE: &str =
    "Sorry, I could not find any matching items in the knowledge base for your request.";

const NONE_QUALIFY_MESSAGE: &str = "I found some similar items, but on closer inspection none of \
     them seem to fully match your specific requirements.";

const MISSING_ANSWER_TEXT: &str = "I could not find a suitable answer.";

/// Generative assistant over a pluggable generation backend.
pub struct Assistant {
    generator: Arc<dyn Generator>,
    rerank_top_k: usize,
}

impl Assistant {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self::with_top_k(generator, DEFAULT_RERANK_TOP_K)
    }

    pub fn with_top_k(generator: Arc<dyn Generator>, rerank_top_k: usize) -> Self {
        Self {
            generator,
            rerank_top_k,
        }
    }

    /// Rerank candidates by relevance to the query.
    ///
    /// When every candidate already carries a distance, the vector
    /// store's own ranking is trusted and no LLM call is made. All
    /// other failure modes (transport errors, unparsable output, a
    /// missing or malformed `reranked_indices`) degrade to the
    /// original order with a warning. The result maps returned indices
    /// back onto the input, silently dropping out-of-range ones, so it
    /// may be shorter than the input.
    pub async fn rerank(
        &self,
        instruction: &str,
        candidates: &[Candidate],
        query_image: Option<&str>,
        query_text: Option<&str>,
    ) -> Vec<Candidate> {
        if candidates.is_empty() {
            return Vec::new();
        }

        if candidates.iter().all(|c| c.distance.is_some()) {
            tracing::debug!("Distances present; sorting by distance and skipping LLM rerank");
            let mut sorted = candidates.to_vec();
            sorted.sort_by(|a, b| {
                a.distance
                    .unwrap_or(f32::INFINITY)
                    .total_cmp(&b.distance.unwrap_or(f32::INFINITY))
            });
            return sorted;
        }

        tracing::debug!("Reranking {} candidates via LLM", candidates.len());
        match self
            .try_rerank(instruction, candidates, query_image, query_text)
            .await
        {
            Ok(reranked) => {
                tracing::debug!("Rerank kept {} of {} candidates", reranked.len(), candidates.len());
                reranked
            }
            Err(error) => {
                tracing::warn!("Rerank failed ({error}); keeping original order");
                candidates.to_vec()
            }
        }
    }

    async fn try_rerank(
        &self,
        instruction: &str,
        candidates: &[Candidate],
        query_image: Option<&str>,
        query_text: Option<&str>,
    ) -> DomainResult<Vec<Candidate>> {
        let prompt = rerank_prompt(instruction, candidates, query_image, query_text);
        let raw = self.generator.generate(&prompt, GenerateOptions::json()).await?;

        let Some(object) = extract_json_object(&raw) else {
            tracing::warn!("Rerank response contained no JSON object; keeping original order");
            return Ok(candidates.to_vec());
        };

        let parsed: serde_json::Value = serde_json::from_str(object)?;
        let Some(indices) = parsed.get("reranked_indices").and_then(|v| v.as_array()) else {
            tracing::warn!("Rerank response missing 'reranked_indices' list; keeping original order");
            return Ok(candidates.to_vec());
        };

        Ok(indices
            .iter()
            .filter_map(serde_json::Value::as_u64)
            .filter_map(|index| usize::try_from(index).ok())
            .filter(|&index| index < candidates.len())
            .map(|index| candidates[index].clone())
            .collect())
    }

    /// Answer the query from the retrieved candidates.
    ///
    /// Returns the answer text, an optional recommendation index into
    /// the returned references, and the references themselves. Only a
    /// transport failure of the final generation call can error;
    /// malformed model output always degrades to a usable answer.
    pub async fn answer(
        &self,
        instruction: &str,
        candidates: Vec<Candidate>,
        query_image: Option<&str>,
        query_text: Option<&str>,
    ) -> DomainResult<Answer> {
        if candidates.is_empty() {
            return Ok(Answer::plain(NO_RESULTS_MESSAGE, Vec::new()));
        }

        let reranked = self
            .rerank(instruction, &candidates, query_image, query_text)
            .await;

        // Non-empty input reranked down to zero is a distinct outcome:
        // the pre-rerank candidates stay available as references.
        if reranked.is_empty() {
            return Ok(Answer::plain(NONE_QUALIFY_MESSAGE, candidates));
        }

        let mut finalists = reranked;
        finalists.truncate(self.rerank_top_k);

        let prompt = answer_prompt(instruction, &finalists, query_image, query_text);
        let raw = self.generator.generate(&prompt, GenerateOptions::json()).await?;

        Ok(parse_answer(raw, finalists))
    }
}

/// Parse the final-answer response, degrading on every malformation.
fn parse_answer(raw: String, finalists: Vec<Candidate>) -> Answer {
    let Some(object) = extract_json_object(&raw) else {
        // No JSON at all: the whole response becomes the answer
        return Answer::plain(raw, finalists);
    };

    let parsed: serde_json::Value = match serde_json::from_str(object) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!("Answer response JSON failed to decode ({error}); using raw text");
            return Answer::plain(raw, finalists);
        }
    };

    let answer_text = parsed
        .get("answer_text")
        .and_then(|v| v.as_str())
        .map_or_else(|| MISSING_ANSWER_TEXT.to_string(), str::to_string);

    let recommended_index = parsed
        .get("recommended_index")
        .and_then(serde_json::Value::as_u64)
        .and_then(|index| usize::try_from(index).ok())
        .filter(|&index| index < finalists.len());

    Answer {
        answer_text,
        recommended_index,
        references: finalists,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::generators::MockGenerator;
    use crate::domain::models::Metadata;
    use serde_json::json;

    fn candidate(desc: &str) -> Candidate {
        let mut fields = Metadata::new();
        fields.insert("url".to_string(), json!(format!("https://x/{desc}.jpg")));
        fields.insert("desc".to_string(), json!(desc));
        Candidate::new(fields)
    }

    fn candidate_with_distance(desc: &str, distance: f32) -> Candidate {
        let mut c = candidate(desc);
        c.distance = Some(distance);
        c
    }

    fn descs(candidates: &[Candidate]) -> Vec<&str> {
        candidates
            .iter()
            .map(|c| c.field_str("desc").unwrap())
            .collect()
    }

    fn assistant(generator: Arc<MockGenerator>) -> Assistant {
        Assistant::new(generator)
    }

    #[tokio::test]
    async fn test_rerank_sorts_by_distance_without_llm_call() {
        let generator = Arc::new(MockGenerator::new());
        let assistant = assistant(generator.clone());

        let candidates = vec![
            candidate_with_distance("far", 0.9),
            candidate_with_distance("near", 0.1),
            candidate_with_distance("mid", 0.5),
        ];

        let reranked = assistant.rerank("q", &candidates, None, None).await;

        assert_eq!(descs(&reranked), vec!["near", "mid", "far"]);
        assert_eq!(generator.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_rerank_applies_returned_permutation() {
        let generator = Arc::new(MockGenerator::new());
        generator.enqueue(r#"{"reranked_indices": [2, 0, 1]}"#).await;
        let assistant = assistant(generator.clone());

        let candidates = vec![candidate("a"), candidate("b"), candidate("c")];
        let reranked = assistant.rerank("q", &candidates, None, None).await;

        assert_eq!(descs(&reranked), vec!["c", "a", "b"]);
        assert_eq!(generator.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_rerank_drops_out_of_range_indices() {
        let generator = Arc::new(MockGenerator::new());
        generator.enqueue(r#"{"reranked_indices": [2, 5]}"#).await;
        let assistant = assistant(generator);

        let candidates = vec![candidate("a"), candidate("b"), candidate("c")];
        let reranked = assistant.rerank("q", &candidates, None, None).await;

        assert_eq!(descs(&reranked), vec!["c"]);
    }

    #[tokio::test]
    async fn test_rerank_falls_back_on_unparsable_text() {
        let generator = Arc::new(MockGenerator::new());
        generator.enqueue("I cannot rank these, sorry!").await;
        let assistant = assistant(generator);

        let candidates = vec![candidate("a"), candidate("b")];
        let reranked = assistant.rerank("q", &candidates, None, None).await;

        assert_eq!(descs(&reranked), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_rerank_falls_back_when_indices_not_a_list() {
        let generator = Arc::new(MockGenerator::new());
        generator.enqueue(r#"{"reranked_indices": "2,0,1"}"#).await;
        let assistant = assistant(generator);

        let candidates = vec![candidate("a"), candidate("b")];
        let reranked = assistant.rerank("q", &candidates, None, None).await;

        assert_eq!(descs(&reranked), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_rerank_falls_back_on_generator_error() {
        let generator = Arc::new(MockGenerator::new());
        generator.enqueue_error("connection reset").await;
        let assistant = assistant(generator);

        let candidates = vec![candidate("a"), candidate("b")];
        let reranked = assistant.rerank("q", &candidates, None, None).await;

        assert_eq!(descs(&reranked), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_rerank_wraps_json_in_prose() {
        let generator = Arc::new(MockGenerator::new());
        generator
            .enqueue("Here you go:\n```json\n{\"reranked_indices\": [1, 0]}\n```")
            .await;
        let assistant = assistant(generator);

        let candidates = vec![candidate("a"), candidate("b")];
        let reranked = assistant.rerank("q", &candidates, None, None).await;

        assert_eq!(descs(&reranked), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_answer_empty_candidates_skips_all_llm_calls() {
        let generator = Arc::new(MockGenerator::new());
        let assistant = assistant(generator.clone());

        let answer = assistant.answer("q", Vec::new(), None, None).await.unwrap();

        assert_eq!(answer.answer_text, NO_RESULTS_MESSAGE);
        assert!(answer.recommended_index.is_none());
        assert!(answer.references.is_empty());
        assert_eq!(generator.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_answer_reranked_to_zero_keeps_original_references() {
        let generator = Arc::new(MockGenerator::new());
        // Model drops every index
        generator.enqueue(r#"{"reranked_indices": []}"#).await;
        let assistant = assistant(generator.clone());

        let candidates = vec![candidate("a"), candidate("b")];
        let answer = assistant
            .answer("q", candidates.clone(), None, None)
            .await
            .unwrap();

        assert_eq!(answer.answer_text, NONE_QUALIFY_MESSAGE);
        assert!(answer.recommended_index.is_none());
        assert_eq!(descs(&answer.references), vec!["a", "b"]);
        // Only the rerank call happened
        assert_eq!(generator.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_answer_truncates_to_top_k_and_validates_index() {
        let generator = Arc::new(MockGenerator::new());
        generator
            .enqueue(r#"{"reranked_indices": [3, 2, 1, 0]}"#)
            .await;
        generator
            .enqueue(r#"{"recommended_index": 1, "answer_text": "the second one fits"}"#)
            .await;
        let assistant = Assistant::with_top_k(generator.clone(), 3);

        let candidates = vec![
            candidate("a"),
            candidate("b"),
            candidate("c"),
            candidate("d"),
        ];
        let answer = assistant.answer("q", candidates, None, None).await.unwrap();

        assert_eq!(answer.answer_text, "the second one fits");
        assert_eq!(answer.recommended_index, Some(1));
        // Top-3 of the reversed order
        assert_eq!(descs(&answer.references), vec!["d", "c", "b"]);
        assert_eq!(answer.recommended().unwrap().field_str("desc"), Some("c"));
    }

    #[tokio::test]
    async fn test_answer_out_of_range_recommendation_becomes_none() {
        let generator = Arc::new(MockGenerator::new());
        generator.enqueue(r#"{"reranked_indices": [0, 1]}"#).await;
        generator
            .enqueue(r#"{"recommended_index": 9, "answer_text": "pick nine"}"#)
            .await;
        let assistant = assistant(generator);

        let candidates = vec![candidate("a"), candidate("b")];
        let answer = assistant.answer("q", candidates, None, None).await.unwrap();

        assert_eq!(answer.answer_text, "pick nine");
        assert!(answer.recommended_index.is_none());
    }

    #[tokio::test]
    async fn test_answer_negative_or_null_recommendation_becomes_none() {
        for reply in [
            r#"{"recommended_index": -1, "answer_text": "t"}"#,
            r#"{"recommended_index": null, "answer_text": "t"}"#,
            r#"{"recommended_index": "0", "answer_text": "t"}"#,
        ] {
            let generator = Arc::new(MockGenerator::new());
            generator.enqueue(r#"{"reranked_indices": [0]}"#).await;
            generator.enqueue(reply).await;
            let assistant = assistant(generator);

            let answer = assistant
                .answer("q", vec![candidate("a")], None, None)
                .await
                .unwrap();
            assert_eq!(answer.answer_text, "t");
            assert!(answer.recommended_index.is_none());
        }
    }

    #[tokio::test]
    async fn test_answer_uses_raw_text_when_no_json() {
        let generator = Arc::new(MockGenerator::new());
        generator.enqueue(r#"{"reranked_indices": [0]}"#).await;
        generator.enqueue("Just a plain sentence.").await;
        let assistant = assistant(generator);

        let answer = assistant
            .answer("q", vec![candidate("a")], None, None)
            .await
            .unwrap();

        assert_eq!(answer.answer_text, "Just a plain sentence.");
        assert!(answer.recommended_index.is_none());
        assert_eq!(descs(&answer.references), vec!["a"]);
    }

    #[tokio::test]
    async fn test_answer_uses_raw_text_on_decode_error() {
        let generator = Arc::new(MockGenerator::new());
        generator.enqueue(r#"{"reranked_indices": [0]}"#).await;
        generator.enqueue(r#"{"answer_text": broken}"#).await;
        let assistant = assistant(generator);

        let answer = assistant
            .answer("q", vec![candidate("a")], None, None)
            .await
            .unwrap();

        assert_eq!(answer.answer_text, r#"{"answer_text": broken}"#);
        assert!(answer.recommended_index.is_none());
    }

    #[tokio::test]
    async fn test_answer_missing_answer_text_uses_fixed_message() {
        let generator = Arc::new(MockGenerator::new());
        generator.enqueue(r#"{"reranked_indices": [0]}"#).await;
        generator.enqueue(r#"{"recommended_index": 0}"#).await;
        let assistant = assistant(generator);

        let answer = assistant
            .answer("q", vec![candidate("a")], None, None)
            .await
            .unwrap();

        assert_eq!(answer.answer_text, MISSING_ANSWER_TEXT);
        assert_eq!(answer.recommended_index, Some(0));
    }

    #[tokio::test]
    async fn test_answer_never_panics_on_arbitrary_replies() {
        for reply in ["", "{}", "null", "[1,2,3]", "{\"nested\": {\"deep\": {}}}", "```{```"] {
            let generator = Arc::new(MockGenerator::new());
            generator.enqueue(r#"{"reranked_indices": [0]}"#).await;
            generator.enqueue(reply).await;
            let assistant = assistant(generator);

            let answer = assistant
                .answer("q", vec![candidate("a")], None, None)
                .await
                .unwrap();
            assert!(!answer.references.is_empty());
        }
    }

    #[tokio::test]
    async fn test_answer_propagates_final_call_transport_error() {
        let generator = Arc::new(MockGenerator::new());
        generator.enqueue(r#"{"reranked_indices": [0]}"#).await;
        generator.enqueue_error("connection reset").await;
        let assistant = assistant(generator);

        let result = assistant.answer("q", vec![candidate("a")], None, None).await;
        assert!(result.is_err());
    }
}
