use finplex_core::{CommandInput, Platform};
use serde_json::Value;

use crate::cli::CallArgs;
use crate::error::CliError;

use super::render;

pub async fn run(args: &CallArgs, platform: &Platform, pretty: bool) -> Result<(), CliError> {
    let mut input = CommandInput::new();
    if let Some(provider) = &args.provider {
        input = input.with_provider(provider);
    }
    for raw in &args.params {
        let (key, value) = split_pair(raw, "--param")?;
        input = input.with_param(key, parse_value(value));
    }
    for raw in &args.credentials {
        let (name, value) = split_pair(raw, "--credential")?;
        input = input.with_credential(name, value);
    }

    let response = platform.respond(&args.path, input).await;
    render(&response.body, pretty)?;
    if response.status != 200 {
        let kind = response
            .body
            .get("error_kind")
            .and_then(Value::as_str)
            .unwrap_or("Error")
            .to_owned();
        return Err(CliError::Response {
            status: response.status,
            kind,
        });
    }
    Ok(())
}

fn split_pair<'a>(raw: &'a str, flag: &str) -> Result<(&'a str, &'a str), CliError> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim(), value))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| CliError::Command(format!("{flag} expects KEY=VALUE, got '{raw}'")))
}

/// `limit=5` is a number, `is_done=true` a boolean, anything unparseable stays text.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}
