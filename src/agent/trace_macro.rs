/*
 * src/agent/trace_macro.rs
 *
 * `tool_trace!` — a single-line structured `tracing` event for one
 * agent/tool invocation, so every MapAdapter call and specialist agent run
 * logs in a consistent, greppable shape (`agent`, `tool`, `status`, an
 * optional `details`) without every call site hand-rolling the fields.
 */

#[macro_export]
macro_rules! tool_trace {
	($agent:expr, $tool:expr, $status:expr) => {
		tracing::info!(target: "tool_trace", agent = $agent, tool = $tool, status = $status);
	};
	($agent:expr, $tool:expr, $status:expr, $details:expr) => {
		tracing::info!(target: "tool_trace", agent = $agent, tool = $tool, status = $status, details = %$details);
	};
}
