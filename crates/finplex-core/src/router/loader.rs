use tracing::{debug, error};

use crate::router::{RegistrationContext, Router};
use crate::CoreError;

pub type RouterLoadFn = fn(&RegistrationContext<'_>) -> Result<Router, CoreError>;

/// One entry of the installed router table, mounted at `/<name>`.
#[derive(Clone, Copy)]
pub struct RouterExtension {
    pub name: &'static str,
    pub load: RouterLoadFn,
}

impl RouterExtension {
    pub const fn new(name: &'static str, load: RouterLoadFn) -> Self {
        Self { name, load }
    }
}

pub struct RouterLoader;

impl RouterLoader {
    /// Loads every router extension in name order into one root router.
    ///
    /// Registration errors (signature, types, unknown model, duplicate path) surface
    /// unchanged; any other failure is reported as a loading error naming the extension.
    pub fn from_extensions(
        extensions: &[RouterExtension],
        ctx: &RegistrationContext<'_>,
    ) -> Result<Router, CoreError> {
        let mut ordered = extensions.to_vec();
        ordered.sort_by_key(|extension| extension.name);

        let mut root = Router::new("");
        for extension in ordered {
            let router = (extension.load)(ctx).map_err(|err| {
                error!(extension = extension.name, error = %err, "router extension failed to load");
                if is_registration_error(&err) {
                    err
                } else {
                    CoreError::loading(extension.name, err)
                }
            })?;
            let count = router.routes().len();
            root.include_router(router, &format!("/{}", extension.name))?;
            debug!(extension = extension.name, routes = count, "router extension loaded");
        }
        Ok(root)
    }
}

fn is_registration_error(err: &CoreError) -> bool {
    matches!(
        err,
        CoreError::Signature { .. }
            | CoreError::InvalidParameterType { .. }
            | CoreError::InvalidReturnType { .. }
            | CoreError::UnknownModel { .. }
            | CoreError::DuplicateRoute { .. }
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::envelope::Envelope;
    use crate::provider_interface::ProviderInterface;
    use crate::registry::Registry;
    use crate::router::{Command, FnCommand, ParamType, ScalarType, Signature};
    use crate::standard_models;

    fn zeta(ctx: &RegistrationContext<'_>) -> Result<Router, CoreError> {
        let mut router = Router::new("");
        router.command(
            ctx,
            Command::new(
                Signature::new("finplex.zeta_router", "last"),
                FnCommand::new(|_, _, _| Ok(Envelope::new(json!(null)))),
            ),
        )?;
        Ok(router)
    }

    fn alpha(ctx: &RegistrationContext<'_>) -> Result<Router, CoreError> {
        let mut router = Router::new("");
        router.command(
            ctx,
            Command::new(
                Signature::new("finplex.alpha_router", "first"),
                FnCommand::new(|_, _, _| Ok(Envelope::new(json!(null)))),
            ),
        )?;
        Ok(router)
    }

    fn broken(ctx: &RegistrationContext<'_>) -> Result<Router, CoreError> {
        let mut router = Router::new("");
        router.command(
            ctx,
            Command::new(
                Signature::new("finplex.broken_router", "bad").param("cc", ParamType::scalar(ScalarType::Int)),
                FnCommand::new(|_, _, _| Ok(Envelope::new(json!(null)))),
            ),
        )?;
        Ok(router)
    }

    fn failing(_: &RegistrationContext<'_>) -> Result<Router, CoreError> {
        Err(CoreError::Config(String::from("bad router config")))
    }

    fn interface() -> ProviderInterface {
        ProviderInterface::new(&Registry::default(), &standard_models::catalogue()).expect("builds")
    }

    #[test]
    fn mounts_extensions_in_name_order() {
        let interface = interface();
        let ctx = RegistrationContext {
            interface: &interface,
            debug_mode: false,
        };
        let root = RouterLoader::from_extensions(
            &[RouterExtension::new("zeta", zeta), RouterExtension::new("alpha", alpha)],
            &ctx,
        )
        .expect("loads");

        let paths = root.routes().iter().map(|route| route.path.as_str()).collect::<Vec<_>>();
        assert_eq!(paths, vec!["/alpha/first", "/zeta/last"]);
    }

    #[test]
    fn signature_errors_surface_unchanged_and_others_become_loading_errors() {
        let interface = interface();
        let ctx = RegistrationContext {
            interface: &interface,
            debug_mode: false,
        };

        let err = RouterLoader::from_extensions(&[RouterExtension::new("broken", broken)], &ctx)
            .expect_err("must fail");
        assert_eq!(err.error_kind(), "SignatureError");

        let err = RouterLoader::from_extensions(&[RouterExtension::new("failing", failing)], &ctx)
            .expect_err("must fail");
        assert!(matches!(err, CoreError::Loading { ref extension, .. } if extension == "failing"));
    }
}
