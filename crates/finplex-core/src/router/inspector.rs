use tracing::warn;

use crate::provider_interface::ProviderInterface;
use crate::router::signature::{ParamType, ReservedKind, ReturnType, Signature, ValueType};
use crate::router::validator::signature_error;
use crate::standard_models::ResultShape;
use crate::CoreError;

/// Completes and describes command signatures at registration time.
pub struct SignatureInspector;

impl SignatureInspector {
    /// Binds a signature to `model`, or to the provider list for model-less commands.
    ///
    /// Returns `Ok(None)` when the route must be skipped: the model is unknown and
    /// `debug_mode` is on. Outside debug mode an unknown model is an error.
    /// Signatures not returning an envelope are returned untouched for the validator.
    pub fn complete_signature(
        signature: Signature,
        model: Option<&str>,
        interface: &ProviderInterface,
        debug_mode: bool,
    ) -> Result<Option<Signature>, CoreError> {
        if matches!(signature.returns, ReturnType::Other(_)) {
            return Ok(Some(signature));
        }

        let Some(model) = model.filter(|model| !model.is_empty()) else {
            return Ok(Some(Self::bind_provider_choices(signature, interface)));
        };

        if !interface.contains(model) {
            let path = format!("/{}", signature.function);
            if debug_mode {
                warn!(
                    route = %path,
                    model,
                    "skipping route: model not found in the provider interface"
                );
                return Ok(None);
            }
            return Err(CoreError::UnknownModel {
                model: model.to_owned(),
                path,
            });
        }

        Self::validate_signature(&signature)?;

        let mut signature = signature;
        Self::inject(
            &mut signature,
            ReservedKind::ProviderChoices,
            ParamType::BoundProviderChoices(interface.model_providers(model)),
        );
        if let Some(schema) = interface.standard_params(model) {
            Self::inject(
                &mut signature,
                ReservedKind::StandardParams,
                ParamType::BoundStandardParams(schema.clone()),
            );
        }
        Self::inject(
            &mut signature,
            ReservedKind::ExtraParams,
            ParamType::BoundExtraParams(interface.extra_params(model).to_vec()),
        );

        if let (Some(data), Some(shape)) = (interface.return_schema(model), interface.result_shape(model)) {
            signature.returns = Self::return_type(ValueType::Model(data.clone()), shape);
        }

        Ok(Some(signature))
    }

    /// Envelope of the model's data type, wrapped according to the result shape.
    pub fn return_type(inner: ValueType, shape: ResultShape) -> ReturnType {
        let results = match shape {
            ResultShape::Single => inner,
            ResultShape::List => ValueType::list(inner),
            ResultShape::SingleOrList => ValueType::one_or_many(inner),
        };
        ReturnType::Envelope(results)
    }

    /// The three model parameters must be present with exactly their abstract types.
    pub fn validate_signature(signature: &Signature) -> Result<(), CoreError> {
        let expected = [
            (ReservedKind::ProviderChoices, ParamType::ProviderChoices),
            (ReservedKind::StandardParams, ParamType::StandardParams),
            (ReservedKind::ExtraParams, ParamType::ExtraParams),
        ];
        for (kind, abstract_type) in expected {
            match signature.parameter(kind.param_name()) {
                None => {
                    return Err(signature_error(
                        signature,
                        kind.param_name(),
                        String::from("is missing"),
                    ));
                }
                Some(param) if param.ty != abstract_type => {
                    return Err(signature_error(
                        signature,
                        kind.param_name(),
                        format!("must be of type '{}'", kind.type_name()),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn bind_provider_choices(mut signature: Signature, interface: &ProviderInterface) -> Signature {
        let abstract_choice = signature
            .parameter(ReservedKind::ProviderChoices.param_name())
            .is_some_and(|param| param.ty == ParamType::ProviderChoices);
        if abstract_choice {
            Self::inject(
                &mut signature,
                ReservedKind::ProviderChoices,
                ParamType::BoundProviderChoices(interface.provider_choices().to_vec()),
            );
        }
        signature
    }

    fn inject(signature: &mut Signature, kind: ReservedKind, ty: ParamType) {
        if let Some(param) = signature.parameter_mut(kind.param_name()) {
            param.ty = ty;
        }
    }

    /// Doc text up to a `Parameters` or `Returns` section, each line trimmed.
    pub fn description(doc: &str) -> String {
        doc.lines()
            .take_while(|line| !matches!(line.trim(), "Parameters" | "Returns"))
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_owned()
    }

    /// Module segments after the first, then the function name; a trailing `_router`
    /// is stripped from each segment and repeats are dropped keeping the first.
    pub fn operation_id(module: &str, function: &str) -> String {
        let segments = module.split('.').skip(1).collect::<Vec<_>>();
        Self::operation_id_from_segments(&segments, function)
    }

    pub fn operation_id_from_segments(segments: &[&str], function: &str) -> String {
        let mut seen: Vec<&str> = Vec::new();
        for segment in segments.iter().copied().chain(std::iter::once(function)) {
            let cleaned = segment.strip_suffix("_router").unwrap_or(segment);
            if !cleaned.is_empty() && !seen.contains(&cleaned) {
                seen.push(cleaned);
            }
        }
        seen.join("_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::router::signature::ScalarType;
    use crate::standard_models;

    fn empty_interface() -> ProviderInterface {
        ProviderInterface::new(&Registry::default(), &standard_models::catalogue())
            .expect("interface should build")
    }

    #[test]
    fn operation_id_strips_router_suffix_and_duplicates() {
        assert_eq!(
            SignatureInspector::operation_id_from_segments(
                &["equity", "discovery_router", "discovery"],
                "filings"
            ),
            "equity_discovery_filings"
        );
        assert_eq!(
            SignatureInspector::operation_id("finplex.equity.discovery_router.discovery", "filings"),
            "equity_discovery_filings"
        );
    }

    #[test]
    fn description_stops_at_parameters_section() {
        let doc = "  Get the dividend calendar.\n  Upcoming only.\n\n  Parameters\n  ----------\n  x: int";
        assert_eq!(
            SignatureInspector::description(doc),
            "Get the dividend calendar.\nUpcoming only."
        );
        assert_eq!(SignatureInspector::description(""), "");
    }

    #[test]
    fn unknown_model_is_skipped_in_debug_and_refused_otherwise() {
        let interface = empty_interface();
        let signature = Signature::model_command("finplex.equity.calendar_router", "dividend");

        let skipped = SignatureInspector::complete_signature(
            signature.clone(),
            Some("NoSuchModel"),
            &interface,
            true,
        )
        .expect("debug mode skips");
        assert!(skipped.is_none());

        let err = SignatureInspector::complete_signature(signature, Some("NoSuchModel"), &interface, false)
            .expect_err("production refuses");
        assert_eq!(err.error_kind(), "UnknownModel");
    }

    #[test]
    fn binds_model_parameters_and_list_return() {
        let interface = empty_interface();
        let signature = Signature::model_command("finplex.equity.calendar_router", "dividend");

        let bound = SignatureInspector::complete_signature(
            signature,
            Some("DividendCalendar"),
            &interface,
            false,
        )
        .expect("completion succeeds")
        .expect("route is kept");

        assert!(matches!(
            bound.parameter("standard_params").map(|p| &p.ty),
            Some(ParamType::BoundStandardParams(schema)) if schema.name == "DividendCalendarQuery"
        ));
        assert_eq!(bound.returns.type_name(), "Envelope[List[DividendCalendarData]]");
    }

    #[test]
    fn model_commands_need_abstract_reserved_params() {
        let interface = empty_interface();
        let missing = Signature::new("finplex.equity.calendar_router", "dividend")
            .param("cc", ParamType::Context)
            .param("standard_params", ParamType::StandardParams)
            .param("extra_params", ParamType::ExtraParams);
        let retyped = Signature::new("finplex.equity.calendar_router", "dividend")
            .param("provider_choices", ParamType::scalar(ScalarType::Str))
            .param("standard_params", ParamType::StandardParams)
            .param("extra_params", ParamType::ExtraParams);

        for signature in [missing, retyped] {
            let err = SignatureInspector::complete_signature(
                signature,
                Some("DividendCalendar"),
                &interface,
                false,
            )
            .expect_err("must fail");
            assert!(matches!(err, CoreError::Signature { ref parameter, .. } if parameter == "provider_choices"));
        }
    }

    #[test]
    fn single_or_list_shape_wraps_in_union() {
        let returns = SignatureInspector::return_type(ValueType::Record, ResultShape::SingleOrList);
        assert_eq!(returns.type_name(), "Envelope[Union[List[Record], Record]]");
    }
}
