//! Pipeline orchestration: the core's single entry point.
//!
//! Wires annotator → composer → gateway → parser → mutator → (repair) →
//! strip → dedup into one `async fn`. Errors during the pipeline are
//! caught and rendered as an embedded `<script id="error">` block; only
//! a first-pass transport failure is returned to the caller as an `Err`.

use crate::annotator::strip_node_ids;
use crate::composer::{compose_system_message, compose_user_message, SystemMessageInputs, ThemeInfo};
use crate::dedup::deduplicate_inline_scripts;
use crate::error_injection::inject_error;
use crate::gateway::{CompletePrompt, CompletionRequest, CompletionResult};
use crate::mutator::apply_change_list;
use crate::parser::parse_change_list;
use crate::repair::run_repair;

/// All inputs to a single transform request.
pub struct TransformRequest {
    pub annotated_source: String,
    pub message: String,
    pub max_tokens: u32,
    pub instructions: Option<String>,
    pub model_instructions: Option<String>,
    pub theme_info: Option<ThemeInfo>,
    pub scripts: Option<String>,
    pub connectors: Option<String>,
    pub agents: Option<String>,
    pub route_hints: Option<String>,
    pub custom_transform_instructions: Option<Vec<String>>,
}

/// A successful pipeline result. The underlying gateway's
/// `completed:false` case is modeled as `Err(TransportFailure)` instead,
/// reserved for the first-pass transport failure only.
pub struct TransformOutcome {
    pub html: String,
    pub change_count: usize,
}

/// The only error variant the core returns to its caller: a first-pass
/// LLM transport failure.
#[derive(Debug, Clone)]
pub struct TransportFailure {
    pub error: String,
}

/// Run one full annotate → prompt → mutate → repair → clean cycle.
pub async fn transform_page(
    req: TransformRequest,
    complete_prompt: &dyn CompletePrompt,
) -> Result<TransformOutcome, TransportFailure> {
    let system = compose_system_message(&SystemMessageInputs {
        annotated_source: &req.annotated_source,
        scripts: req.scripts.as_deref(),
        theme_info: req.theme_info.as_ref(),
        connectors: req.connectors.as_deref(),
        agents: req.agents.as_deref(),
        route_hints: req.route_hints.as_deref(),
        user_message: &req.message,
    });
    let prompt = compose_user_message(
        req.instructions.as_deref(),
        req.model_instructions.as_deref(),
        req.custom_transform_instructions.as_deref(),
    );

    let result = complete_prompt
        .complete(CompletionRequest {
            system,
            prompt,
            max_tokens: req.max_tokens,
        })
        .await;

    let text = match result {
        CompletionResult::Completed(text) => text,
        CompletionResult::Failed(error) => return Err(TransportFailure { error }),
    };

    Ok(run_pipeline_tail(&req.annotated_source, &text, req.max_tokens, complete_prompt).await)
}

/// Everything after the first LLM call succeeds: parse, mutate, repair
/// if needed, strip, dedup. Infallible from the caller's point of view —
/// any internal failure degrades to an error-injected result instead of
/// propagating.
async fn run_pipeline_tail(
    annotated_source: &str,
    first_pass_text: &str,
    max_tokens: u32,
    complete_prompt: &dyn CompletePrompt,
) -> TransformOutcome {
    let change_list = match parse_change_list(first_pass_text) {
        Ok(list) => list,
        Err(_) => return error_outcome(annotated_source, "Could not understand the model's response."),
    };

    let mutation = match apply_change_list(annotated_source, &change_list) {
        Ok(outcome) => outcome,
        Err(e) => return error_outcome(annotated_source, &e.to_string()),
    };

    let mut change_count = mutation.applied_count;
    let mut html = mutation.html;

    if !mutation.failed_ops.is_empty() {
        match run_repair(&html, &mutation.failed_ops, max_tokens, complete_prompt).await {
            Ok(repair_outcome) => {
                html = repair_outcome.html;
                change_count += repair_outcome.additional_applied;
            }
            Err(e) => return error_outcome(annotated_source, &e.to_string()),
        }
    }

    let stripped = match strip_node_ids(&html) {
        Ok(s) => s,
        Err(e) => return error_outcome(annotated_source, &e.to_string()),
    };

    let deduped = match deduplicate_inline_scripts(&stripped) {
        Ok(s) => s,
        Err(e) => return error_outcome(annotated_source, &e.to_string()),
    };

    TransformOutcome {
        html: deduped,
        change_count,
    }
}

fn error_outcome(annotated_source: &str, details: &str) -> TransformOutcome {
    let stripped = strip_node_ids(annotated_source).unwrap_or_else(|_| annotated_source.to_string());
    let html = inject_error(&stripped, "The page could not be updated.", details)
        .unwrap_or(stripped);
    TransformOutcome {
        html,
        change_count: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotator::assign_node_ids;
    use async_trait::async_trait;

    struct FixedResponse(&'static str);

    #[async_trait]
    impl CompletePrompt for FixedResponse {
        async fn complete(&self, _request: CompletionRequest) -> CompletionResult {
            CompletionResult::Completed(self.0.to_string())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl CompletePrompt for AlwaysFails {
        async fn complete(&self, _request: CompletionRequest) -> CompletionResult {
            CompletionResult::Failed("connection reset".to_string())
        }
    }

    fn base_request(annotated: &str) -> TransformRequest {
        TransformRequest {
            annotated_source: annotated.to_string(),
            message: "say hi".to_string(),
            max_tokens: 1000,
            instructions: None,
            model_instructions: None,
            theme_info: None,
            scripts: None,
            connectors: None,
            agents: None,
            route_hints: None,
            custom_transform_instructions: None,
        }
    }

    #[tokio::test]
    async fn transport_failure_on_first_call_is_returned_as_err() {
        let (annotated, _) = assign_node_ids("<html><body><p>a</p></body></html>").unwrap();
        let result = transform_page(base_request(&annotated), &AlwaysFails).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn non_json_response_yields_error_injected_html_with_zero_changes() {
        let (annotated, _) = assign_node_ids("<html><body><p>a</p></body></html>").unwrap();
        let gateway = FixedResponse("I can't help with that.");
        let outcome = transform_page(base_request(&annotated), &gateway).await.unwrap();
        assert_eq!(outcome.change_count, 0);
        assert!(outcome.html.contains(r#"id="error""#));
        assert!(!outcome.html.contains("data-node-id"));
    }

    #[tokio::test]
    async fn successful_change_list_applies_and_strips_ids() {
        let (annotated, _) = assign_node_ids(r#"<html><body><p id="x">Old</p></body></html>"#).unwrap();
        let node_id = {
            let dom = crate::dom::parse_document(&annotated);
            let mut id = None;
            crate::dom::walk_elements(&dom.document, &mut |n| {
                if id.is_none() && crate::dom::tag_name(n).as_deref() == Some("p") {
                    id = crate::dom::get_attr(n, "data-node-id");
                }
            });
            id.unwrap()
        };
        let response = format!(r#"[{{"op":"update","nodeId":"{}","html":"New"}}]"#, node_id);
        let gateway = FixedResponse(Box::leak(response.into_boxed_str()));
        let outcome = transform_page(base_request(&annotated), &gateway).await.unwrap();
        assert_eq!(outcome.change_count, 1);
        assert!(outcome.html.contains("New"));
        assert!(!outcome.html.contains("data-node-id"));
    }
}
