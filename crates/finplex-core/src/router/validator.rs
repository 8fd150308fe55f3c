use crate::router::signature::{ParamType, ReservedKind, ReturnType, Signature};
use crate::CoreError;

/// Registration-time checks on a (possibly completed) command signature.
pub struct CommandValidator;

impl CommandValidator {
    pub fn check(signature: &Signature) -> Result<(), CoreError> {
        Self::check_parameters(signature)?;
        Self::check_return(signature)
    }

    /// Reserved names must carry their reserved types, reserved types may only appear
    /// under their reserved names, and every other parameter must be serializable.
    pub fn check_parameters(signature: &Signature) -> Result<(), CoreError> {
        for param in &signature.params {
            let declared = param.ty.reserved_kind();
            match ReservedKind::from_param_name(&param.name) {
                Some(expected) if declared != Some(expected) => {
                    return Err(signature_error(
                        signature,
                        &param.name,
                        format!("must be of type '{}'", expected.type_name()),
                    ));
                }
                Some(_) => {}
                None => {
                    if let Some(kind) = declared {
                        return Err(signature_error(
                            signature,
                            &param.name,
                            format!(
                                "uses reserved type '{}' which is only allowed for `{}`",
                                kind.type_name(),
                                kind.param_name()
                            ),
                        ));
                    }
                    if let ParamType::Value(value) = &param.ty {
                        if !value.is_serializable() {
                            return Err(CoreError::InvalidParameterType {
                                module: signature.module.clone(),
                                function: signature.function.clone(),
                                parameter: param.name.clone(),
                                type_name: value.type_name(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn check_return(signature: &Signature) -> Result<(), CoreError> {
        match &signature.returns {
            ReturnType::Envelope(results) if results.is_serializable() => Ok(()),
            other => Err(CoreError::InvalidReturnType {
                module: signature.module.clone(),
                function: signature.function.clone(),
                type_name: other.type_name(),
            }),
        }
    }
}

pub(crate) fn signature_error(signature: &Signature, parameter: &str, message: String) -> CoreError {
    CoreError::Signature {
        module: signature.module.clone(),
        function: signature.function.clone(),
        parameter: parameter.to_owned(),
        message,
    }
}
