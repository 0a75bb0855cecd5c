//! Running the upstream's own timetable renderer.
//!
//! The data blob does not say which subject or teacher sits in which period on its own:
//! the framed document ships a script that turns it into an HTML table. That script
//! changes per deployment. It is evaluated as-is in a sandboxed JavaScript engine with
//! no host bindings at all.

use boa_engine::{Context, Source};
use regex::Regex;

use crate::stdx::error::Invariant;

use super::{errors::ScriptError, markers};

const LOOP_ITERATION_LIMIT: u64 = 10_000_000;
const RECURSION_LIMIT: usize = 512;

/// The inline render script of the framed document and the name of its timetable generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RenderScript {
    body: String,
    function: String,
    loop_iteration_limit: u64,
}

impl RenderScript {
    /// Name of the timetable generator function, e.g. `자료81`.
    pub(super) fn function(&self) -> &str {
        &self.function
    }

    /// Renders the table of one class.
    ///
    /// `blob` must be the data blob JSON. It is placed into the call as an object literal.
    /// Every call gets a new engine context which is dropped before returning.
    pub(super) fn materialize(&self, blob: &str, grade: u8, class: u8) -> Result<String, ScriptError> {
        let script = format!("{}\n\n{}({blob},{grade},{class})", self.body, self.function);

        let mut context = Context::default();
        context
            .runtime_limits_mut()
            .set_loop_iteration_limit(self.loop_iteration_limit);
        context.runtime_limits_mut().set_recursion_limit(RECURSION_LIMIT);

        let value = context
            .eval(Source::from_bytes(script.as_bytes()))
            .map_err(|err| ScriptError::Evaluation(err.to_string()))?;

        value
            .as_string()
            .map(|html| html.to_std_string_escaped())
            .ok_or(ScriptError::NonStringResult)
    }
}

/// Collects the inline render script from the framed `document` and finds its generator.
pub(super) fn extract(document: &str) -> Result<RenderScript, ScriptError> {
    let tag = markers::SCRIPT_OPEN_TAG
        .find(document)
        .ok_or(ScriptError::NoInlineScript)?;

    // Every block opened exactly like the first one belongs to the renderer.
    let blocks = Regex::new(&format!(
        "(?i){}(.*?){}",
        regex::escape(tag.as_str()),
        regex::escape(markers::SCRIPT_CLOSE_TAG)
    ))
    .invariant("escaped script open tag should be a valid regex")?;

    let body: String = blocks
        .captures_iter(document)
        .filter_map(|captures| captures.get(1))
        .map(|block| block.as_str())
        .collect();

    if body.is_empty() {
        return Err(ScriptError::NoInlineScript);
    }

    let declaration = markers::GENERATOR_FUNCTION
        .find(&body)
        .ok_or(ScriptError::NoGeneratorFunction)?;

    let function = declaration
        .as_str()
        .replacen(markers::GENERATOR_ARTIFACT, "", 1)
        .replacen("function", "", 1)
        .trim()
        .to_owned();

    tracing::debug!(function, len = body.len(), "extracted render script");

    Ok(RenderScript {
        body,
        function,
        loop_iteration_limit: LOOP_ITERATION_LIMIT,
    })
}
