use std::collections::BTreeMap;
use std::sync::Arc;

use crate::provider_interface::ProviderInterface;
use crate::router::{Route, Router};

/// Every registered route keyed by path, with coverage views.
///
/// Coverage views take an optional separator that replaces `/` in rendered paths.
#[derive(Debug, Clone)]
pub struct CommandMap {
    routes: BTreeMap<String, Route>,
    interface: Arc<ProviderInterface>,
}

impl CommandMap {
    pub fn new(router: Router, interface: Arc<ProviderInterface>) -> Self {
        let routes = router
            .into_routes()
            .into_iter()
            .map(|route| (route.path.clone(), route))
            .collect();
        Self { routes, interface }
    }

    pub fn get_command(&self, path: &str) -> Option<&Route> {
        self.routes.get(path)
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        self.routes.keys().map(String::as_str).collect()
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn interface(&self) -> &ProviderInterface {
        &self.interface
    }

    /// Provider to the commands it serves. Providers without a routed model are left out.
    pub fn provider_coverage(&self, sep: Option<&str>) -> BTreeMap<String, Vec<String>> {
        let mut coverage = BTreeMap::<String, Vec<String>>::new();
        for route in self.model_routes() {
            for provider in route.provider_choices() {
                coverage
                    .entry(provider)
                    .or_default()
                    .push(render_path(&route.path, sep));
            }
        }
        coverage
    }

    /// Command to the providers that serve it.
    pub fn command_coverage(&self, sep: Option<&str>) -> BTreeMap<String, Vec<String>> {
        self.model_routes()
            .map(|route| (render_path(&route.path, sep), route.provider_choices()))
            .collect()
    }

    /// Command to its standard model.
    pub fn commands_model(&self, sep: Option<&str>) -> BTreeMap<String, String> {
        self.routes
            .values()
            .filter_map(|route| {
                route
                    .model
                    .as_ref()
                    .map(|model| (render_path(&route.path, sep), model.clone()))
            })
            .collect()
    }

    fn model_routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values().filter(|route| route.model.is_some())
    }
}

fn render_path(path: &str, sep: Option<&str>) -> String {
    match sep {
        Some(sep) => path.replace('/', sep),
        None => path.to_owned(),
    }
}
