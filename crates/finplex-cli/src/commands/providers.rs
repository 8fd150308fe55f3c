use finplex_core::provider::Provider;
use finplex_core::Platform;
use serde::Serialize;

use crate::error::CliError;

use super::render;

#[derive(Debug, Serialize, PartialEq)]
struct RequestBudget {
    window_secs: u64,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct ProviderSummary<'a> {
    name: &'a str,
    description: &'a str,
    website: Option<&'a str>,
    credentials: &'a [String],
    models: Vec<&'a str>,
    request_budget: Option<RequestBudget>,
}

fn summarize(provider: &Provider) -> ProviderSummary<'_> {
    ProviderSummary {
        name: provider.name(),
        description: provider.description(),
        website: provider.website(),
        credentials: provider.credentials(),
        models: provider.models(),
        request_budget: provider.policy().map(|policy| RequestBudget {
            window_secs: policy.quota_window.as_secs(),
            limit: policy.quota_limit,
        }),
    }
}

pub fn run(platform: &Platform, pretty: bool) -> Result<(), CliError> {
    let providers = platform
        .registry()
        .providers()
        .map(|provider| summarize(provider))
        .collect::<Vec<_>>();
    render(&providers, pretty)
}
