use finplex_core::Platform;
use serde::Serialize;

use crate::error::CliError;

use super::render;

#[derive(Debug, Serialize)]
struct RouteSummary<'a> {
    path: &'a str,
    operation_id: &'a str,
    model: Option<&'a str>,
    providers: Vec<String>,
    description: &'a str,
}

pub fn run(platform: &Platform, pretty: bool) -> Result<(), CliError> {
    let routes = platform
        .command_map()
        .routes()
        .map(|route| RouteSummary {
            path: &route.path,
            operation_id: &route.operation_id,
            model: route.model.as_deref(),
            providers: route.provider_choices(),
            description: &route.description,
        })
        .collect::<Vec<_>>();
    render(&routes, pretty)
}
