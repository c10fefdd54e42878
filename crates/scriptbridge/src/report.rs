//! Script-level reporting of failed argument conversions

use scriptbridge_sdk::{BridgeError, BridgeResult, ScriptContext};

use crate::defaults::ARGUMENT_ERROR_PREFIX;

/// Raise `"Error processing arguments: <err>"` in the engine.
pub fn report_argument_error(ctx: &dyn ScriptContext, err: &BridgeError) {
    ctx.report_error(&format!("{ARGUMENT_ERROR_PREFIX}: {err}"));
}

/// Pass `result` through, reporting it to the engine when it failed.
pub(crate) fn reported<T>(
    ctx: &dyn ScriptContext,
    what: &'static str,
    result: BridgeResult<T>,
) -> BridgeResult<T> {
    if let Err(err) = &result {
        tracing::debug!(conversion = what, error = %err, "argument conversion failed");
        report_argument_error(ctx, err);
    }
    result
}
