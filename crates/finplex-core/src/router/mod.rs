//! Command registration: signatures are completed against the provider interface,
//! validated, and stored as routes in a prefix tree of routers.

pub mod command_context;
pub mod command_map;
pub mod handler;
pub mod inspector;
pub mod loader;
pub mod query;
pub mod signature;
pub mod validator;

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::provider_interface::{ExtraParam, ProviderInterface};
use crate::schema::Schema;
use crate::standard_models::StandardModel;
use crate::CoreError;

pub use command_context::{CommandContext, SystemSettings};
pub use command_map::CommandMap;
pub use handler::{CommandHandler, CommandInput, FnCommand, HandlerFuture, ModelCommand};
pub use inspector::SignatureInspector;
pub use loader::{RouterExtension, RouterLoadFn, RouterLoader};
pub use query::Query;
pub use signature::{
    ParamType, Parameter, ReservedKind, ReturnType, ScalarType, Signature, ValueType,
};
pub use validator::CommandValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Documented response of a route for one status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseSpec {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ResponseSpec {
    fn new(description: &str, model: Option<&str>) -> Self {
        Self {
            description: description.to_owned(),
            model: model.map(str::to_owned),
        }
    }
}

/// Error responses every route documents.
pub fn default_responses() -> BTreeMap<u16, ResponseSpec> {
    BTreeMap::from([
        (400, ResponseSpec::new("No Results Found", Some("ErrorResponse"))),
        (404, ResponseSpec::new("Not found", None)),
        (500, ResponseSpec::new("Internal Error", Some("ErrorResponse"))),
    ])
}

/// A registered, invocable command.
#[derive(Clone)]
pub struct Route {
    pub path: String,
    pub operation_id: String,
    pub methods: Vec<Method>,
    pub model: Option<String>,
    pub signature: Signature,
    pub description: String,
    pub responses: BTreeMap<u16, ResponseSpec>,
    pub tags: Vec<String>,
    pub handler: Arc<dyn CommandHandler>,
}

impl Route {
    /// Providers the completed signature accepts, sorted.
    pub fn provider_choices(&self) -> Vec<String> {
        match self
            .signature
            .parameter(ReservedKind::ProviderChoices.param_name())
            .map(|param| &param.ty)
        {
            Some(ParamType::BoundProviderChoices(providers)) => providers.clone(),
            _ => Vec::new(),
        }
    }

    pub fn standard_params(&self) -> Option<&Schema> {
        match self
            .signature
            .parameter(ReservedKind::StandardParams.param_name())
            .map(|param| &param.ty)
        {
            Some(ParamType::BoundStandardParams(schema)) => Some(schema),
            _ => None,
        }
    }

    pub fn extra_params(&self) -> &[ExtraParam] {
        match self
            .signature
            .parameter(ReservedKind::ExtraParams.param_name())
            .map(|param| &param.ty)
        {
            Some(ParamType::BoundExtraParams(extras)) => extras,
            _ => &[],
        }
    }

    /// JSON description of the route: parameters, return type and documented responses.
    pub fn schema(&self) -> Value {
        let mut parameters = Map::new();
        for param in &self.signature.params {
            let described = match &param.ty {
                ParamType::Context => continue,
                ParamType::BoundProviderChoices(providers) => json!({
                    "type": "string",
                    "enum": providers,
                }),
                ParamType::BoundStandardParams(schema) => schema.json_schema(),
                ParamType::BoundExtraParams(extras) => Value::Array(
                    extras
                        .iter()
                        .map(|extra| {
                            json!({
                                "name": extra.name,
                                "type": extra.kind.type_name(),
                                "description": extra.description,
                                "providers": extra.providers,
                            })
                        })
                        .collect(),
                ),
                ParamType::Value(value) => {
                    let mut described = value.json_schema();
                    if let Some(default) = &param.default {
                        described["default"] = default.clone();
                    }
                    described
                }
                other => json!({"type": other.type_name()}),
            };
            parameters.insert(param.name.clone(), described);
        }

        let returns = match &self.signature.returns {
            ReturnType::Envelope(results) => json!({
                "type": self.signature.returns.type_name(),
                "results": results.json_schema(),
            }),
            other => json!({"type": other.type_name()}),
        };

        json!({
            "path": self.path,
            "operation_id": self.operation_id,
            "methods": self.methods,
            "model": self.model,
            "description": self.description,
            "tags": self.tags,
            "parameters": parameters,
            "returns": returns,
            "responses": self.responses,
        })
    }
}

impl Debug for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("operation_id", &self.operation_id)
            .field("methods", &self.methods)
            .field("model", &self.model)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// A command before registration.
pub struct Command {
    signature: Signature,
    handler: Arc<dyn CommandHandler>,
    model: Option<String>,
    path: Option<String>,
    methods: Option<Vec<Method>>,
    operation_id: Option<String>,
}

impl Command {
    pub fn new(signature: Signature, handler: impl CommandHandler + 'static) -> Self {
        Self {
            signature,
            handler: Arc::new(handler),
            model: None,
            path: None,
            methods: None,
            operation_id: None,
        }
    }

    /// Command bound to the standard model `M`, served by the generic model handler.
    pub fn model<M: StandardModel>(module: &str, function: &str, doc: &str) -> Self {
        Self::new(
            Signature::model_command(module, function).doc(doc),
            ModelCommand::<M>::new(),
        )
        .with_model(M::NAME)
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_owned());
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_owned());
        self
    }

    pub fn methods(mut self, methods: Vec<Method>) -> Self {
        self.methods = Some(methods);
        self
    }

    pub fn operation_id(mut self, operation_id: &str) -> Self {
        self.operation_id = Some(operation_id.to_owned());
        self
    }
}

/// Registration-time inputs shared by every router.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationContext<'a> {
    pub interface: &'a ProviderInterface,
    pub debug_mode: bool,
}

/// Ordered set of routes under a common path prefix.
#[derive(Debug, Default)]
pub struct Router {
    prefix: String,
    routes: Vec<Route>,
}

impl Router {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_owned(),
            routes: Vec::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Completes, validates and registers `command`.
    ///
    /// A command skipped by completion (unknown model in debug mode) is not registered
    /// and is not an error.
    pub fn command(&mut self, ctx: &RegistrationContext<'_>, command: Command) -> Result<(), CoreError> {
        let Command {
            signature,
            handler,
            model,
            path,
            methods,
            operation_id,
        } = command;

        let Some(signature) = SignatureInspector::complete_signature(
            signature,
            model.as_deref(),
            ctx.interface,
            ctx.debug_mode,
        )?
        else {
            return Ok(());
        };
        CommandValidator::check(&signature)?;

        let path = format!(
            "{}{}",
            self.prefix,
            path.unwrap_or_else(|| format!("/{}", signature.function))
        );
        self.ensure_unique(&path)?;

        let operation_id = operation_id
            .unwrap_or_else(|| SignatureInspector::operation_id(&signature.module, &signature.function));
        let route = Route {
            description: SignatureInspector::description(&signature.doc),
            methods: methods.unwrap_or_else(|| vec![Method::Get]),
            responses: default_responses(),
            tags: Vec::new(),
            path,
            operation_id,
            model,
            signature,
            handler,
        };
        debug!(path = %route.path, operation_id = %route.operation_id, "registered route");
        self.routes.push(route);
        Ok(())
    }

    /// Mounts every route of `router` under `prefix`, tagging it with the prefix name.
    pub fn include_router(&mut self, router: Router, prefix: &str) -> Result<(), CoreError> {
        let prefix = prefix.trim_end_matches('/');
        let tag = prefix.trim_start_matches('/');
        for mut route in router.routes {
            route.path = format!("{}{prefix}{}", self.prefix, route.path);
            self.ensure_unique(&route.path)?;
            if !tag.is_empty() {
                route.tags.insert(0, tag.to_owned());
            }
            self.routes.push(route);
        }
        Ok(())
    }

    fn ensure_unique(&self, path: &str) -> Result<(), CoreError> {
        if self.routes.iter().any(|route| route.path == path) {
            return Err(CoreError::DuplicateRoute {
                path: path.to_owned(),
            });
        }
        Ok(())
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn into_routes(self) -> Vec<Route> {
        self.routes
    }
}
