//! A one-liner-per-section summary of a [`kernel_context::SuperContext`],
//! the first step of turning it into a planning prompt.

use kernel_context::SuperContext;

/// Render a compact, human-readable summary of `ctx` for the Planner's prompt.
pub fn summarize(ctx: &SuperContext) -> String {
    let mut lines = Vec::new();

    match &ctx.memory_context {
        kernel_context::SourceOutcome::Ok { data } => {
            let n = data.lines().filter(|l| !l.trim().is_empty()).count();
            lines.push(format!("Memory: last {n} messages"));
        }
        kernel_context::SourceOutcome::Error { error } => {
            lines.push(format!("Memory: unavailable ({error})"));
        }
    }

    let datasets_ok = ctx.rag.values().filter(|o| o.is_ok()).count();
    let chunk_total: usize = ctx
        .rag
        .values()
        .filter_map(|o| match o {
            kernel_context::SourceOutcome::Ok { data } => Some(data.len()),
            kernel_context::SourceOutcome::Error { .. } => None,
        })
        .sum();
    lines.push(format!("RAG: {datasets_ok} datasets, {chunk_total} chunks"));

    for (label, outcome) in [("Vision", &ctx.vision), ("Audio", &ctx.audio), ("System", &ctx.system)] {
        if let Some(outcome) = outcome {
            let state = if outcome.is_ok() { "present" } else { "unavailable" };
            lines.push(format!("{label}: {state}"));
        }
    }

    lines.join("; ")
}
