//! Commands describing what the platform can serve. They read the assembled
//! command map from the command context and never reach a provider.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::envelope::Envelope;
use crate::router::{
    Command, CommandContext, CommandInput, CommandMap, FnCommand, ParamType, RegistrationContext, ReturnType,
    Route, Router, ScalarType, Signature, ValueType,
};
use crate::CoreError;

const MODULE: &str = "finplex.coverage.coverage_router";

pub fn router(ctx: &RegistrationContext<'_>) -> Result<Router, CoreError> {
    let mut router = Router::new("");
    router.command(
        ctx,
        Command::new(
            coverage_signature("providers", "Map each provider to the commands it serves."),
            FnCommand::new(|cc: &CommandContext, _: &Route, input: CommandInput| {
                let commands = command_map(cc)?;
                coverage_envelope(&commands.provider_coverage(separator(&input)))
            }),
        ),
    )?;
    router.command(
        ctx,
        Command::new(
            coverage_signature("commands", "Map each command to the providers that serve it."),
            FnCommand::new(|cc: &CommandContext, _: &Route, input: CommandInput| {
                let commands = command_map(cc)?;
                coverage_envelope(&commands.command_coverage(separator(&input)))
            }),
        ),
    )?;
    Ok(router)
}

fn coverage_signature(function: &str, doc: &str) -> Signature {
    Signature::new(MODULE, function)
        .doc(&format!("{doc}\n\nParameters\n----------\nsep: Path separator used in command names."))
        .param("cc", ParamType::Context)
        .param_with_default(
            "sep",
            ParamType::Value(ValueType::optional(ValueType::Scalar(ScalarType::Str))),
            Value::Null,
        )
        .returns(ReturnType::Envelope(ValueType::Record))
}

fn command_map(cc: &CommandContext) -> Result<&CommandMap, CoreError> {
    cc.commands
        .as_deref()
        .ok_or_else(|| CoreError::Config(String::from("command map is not available yet")))
}

fn separator(input: &CommandInput) -> Option<&str> {
    input
        .params
        .get("sep")
        .and_then(Value::as_str)
        .filter(|sep| !sep.is_empty())
}

fn coverage_envelope<V: Serialize>(coverage: &BTreeMap<String, V>) -> Result<Envelope<Value>, CoreError> {
    Ok(Envelope::new(serde_json::to_value(coverage)?))
}
