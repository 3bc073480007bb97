//! Repair Controller.
//!
//! When the first mutator pass leaves failed ops behind, re-annotate the
//! post-first-pass tree, compose a repair prompt summarizing the
//! failures, and make exactly one more bounded `completePrompt` call. A
//! repair transport or parse failure is swallowed — the first-pass
//! result stands.

use crate::annotator::{assign_node_ids, strip_node_ids};
use crate::change_list::FailedOp;
use crate::error::CoreError;
use crate::gateway::{CompletePrompt, CompletionRequest, CompletionResult};
use crate::mutator::apply_change_list;
use crate::parser::parse_change_list;

const REPAIR_MAX_TOKENS_CAP: u32 = 4096;

/// Result of attempting a repair round-trip.
pub struct RepairOutcome {
    pub html: String,
    pub additional_applied: usize,
}

/// Run the bounded repair round-trip.
///
/// `first_pass_html` is the mutator's output HTML (still annotated with
/// whatever node IDs survived the first pass — stale and fresh mixed
/// together). This function re-annotates a clean copy before re-prompting.
pub async fn run_repair(
    first_pass_html: &str,
    failed_ops: &[FailedOp],
    original_max_tokens: u32,
    complete_prompt: &dyn CompletePrompt,
) -> Result<RepairOutcome, CoreError> {
    let stripped = strip_node_ids(first_pass_html)?;
    let (reannotated, _node_count) = assign_node_ids(&stripped)?;

    let system = compose_repair_system_message(&reannotated, failed_ops);
    let prompt = repair_user_message();
    let max_tokens = original_max_tokens.min(REPAIR_MAX_TOKENS_CAP);

    let result = complete_prompt
        .complete(CompletionRequest {
            system,
            prompt,
            max_tokens,
        })
        .await;

    let text = match result {
        CompletionResult::Completed(text) => text,
        CompletionResult::Failed(_) => {
            return Ok(RepairOutcome {
                html: stripped,
                additional_applied: 0,
            })
        }
    };

    let repair_ops = match parse_change_list(&text) {
        Ok(ops) => ops,
        Err(_) => {
            return Ok(RepairOutcome {
                html: stripped,
                additional_applied: 0,
            })
        }
    };

    if repair_ops.is_empty() {
        return Ok(RepairOutcome {
            html: stripped,
            additional_applied: 0,
        });
    }

    let outcome = apply_change_list(&reannotated, &repair_ops)?;
    // Residual failures after the repair pass are not retried.
    Ok(RepairOutcome {
        html: outcome.html,
        additional_applied: outcome.applied_count,
    })
}

/// Compose the repair system message: `<CURRENT_PAGE>` (re-annotated)
/// followed by `<FAILED_OPERATIONS>`, a numbered list of op kind, reason,
/// and a JSON dump of the original op.
fn compose_repair_system_message(reannotated_html: &str, failed_ops: &[FailedOp]) -> String {
    let mut failures = String::new();
    for (i, failed) in failed_ops.iter().enumerate() {
        let kind = failed
            .op
            .get("op")
            .and_then(|v| v.as_str())
            .unwrap_or("<unknown>");
        let op_json = serde_json::to_string(&failed.op).unwrap_or_default();
        failures.push_str(&format!(
            "{}. op={} reason=\"{}\" original={}\n",
            i + 1,
            kind,
            failed.reason,
            op_json
        ));
    }

    format!(
        "<CURRENT_PAGE>\n{}\n</CURRENT_PAGE>\n\n<FAILED_OPERATIONS>\n{}</FAILED_OPERATIONS>",
        reannotated_html, failures
    )
}

/// Fixed repair user message: explains that the listed operations failed
/// because their targeted nodes no longer exist and asks for corrected
/// operations or an empty array.
fn repair_user_message() -> String {
    "Some of the operations from your previous response targeted elements \
     that no longer exist, because an earlier operation in the same list \
     already removed or replaced them. The current page has been \
     re-annotated above with fresh node ids. Provide corrected operations \
     that target the current tree, or return an empty JSON array `[]` if \
     no further changes are needed. Respond with a JSON array and nothing \
     else."
        .to_string()
}
