//! Explicit descriptors for command signatures.

use serde_json::{json, Value};

use crate::provider_interface::ExtraParam;
use crate::schema::Schema;

/// Primitive scalar parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Str,
    Int,
    Float,
    Bool,
    Date,
}

impl ScalarType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Date => "date",
        }
    }

    const fn json_type(self) -> &'static str {
        match self {
            Self::Str | Self::Date => "string",
            Self::Int => "integer",
            Self::Float => "number",
            Self::Bool => "boolean",
        }
    }
}

/// Type of a value crossing the command boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueType {
    Scalar(ScalarType),
    Optional(Box<ValueType>),
    List(Box<ValueType>),
    /// Either a list of the inner type or a single inner value.
    OneOrMany(Box<ValueType>),
    /// Structured type described by a schema.
    Model(Schema),
    /// Schema-less JSON object.
    Record,
    /// Any JSON value.
    Json,
    /// Host type with no serializable form, e.g. a file handle.
    Opaque(String),
}

impl ValueType {
    pub fn list(inner: ValueType) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn optional(inner: ValueType) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn one_or_many(inner: ValueType) -> Self {
        Self::OneOrMany(Box::new(inner))
    }

    pub fn type_name(&self) -> String {
        match self {
            Self::Scalar(scalar) => scalar.name().to_owned(),
            Self::Optional(inner) => format!("Optional[{}]", inner.type_name()),
            Self::List(inner) => format!("List[{}]", inner.type_name()),
            Self::OneOrMany(inner) => {
                let inner = inner.type_name();
                format!("Union[List[{inner}], {inner}]")
            }
            Self::Model(schema) => schema.name.clone(),
            Self::Record => String::from("Record"),
            Self::Json => String::from("Json"),
            Self::Opaque(name) => name.clone(),
        }
    }

    /// Scalars, schema models with a valid schema, and containers of those.
    pub fn is_serializable(&self) -> bool {
        match self {
            Self::Scalar(_) | Self::Record | Self::Json => true,
            Self::Optional(inner) | Self::List(inner) | Self::OneOrMany(inner) => {
                inner.is_serializable()
            }
            Self::Model(schema) => schema.validate().is_ok(),
            Self::Opaque(_) => false,
        }
    }

    pub fn json_schema(&self) -> Value {
        match self {
            Self::Scalar(scalar) => {
                let mut schema = json!({"type": scalar.json_type()});
                if *scalar == ScalarType::Date {
                    schema["format"] = json!("date");
                }
                schema
            }
            Self::Optional(inner) => json!({"anyOf": [inner.json_schema(), {"type": "null"}]}),
            Self::List(inner) => json!({"type": "array", "items": inner.json_schema()}),
            Self::OneOrMany(inner) => json!({
                "anyOf": [{"type": "array", "items": inner.json_schema()}, inner.json_schema()]
            }),
            Self::Model(schema) => schema.json_schema(),
            Self::Record => json!({"type": "object"}),
            Self::Json | Self::Opaque(_) => json!({}),
        }
    }
}

/// Type of one declared command parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    Value(ValueType),
    /// Command context, reserved for `cc`.
    Context,
    /// Abstract provider choice, bound at registration.
    ProviderChoices,
    /// Abstract standard parameters, bound at registration.
    StandardParams,
    /// Abstract extra parameters, bound at registration.
    ExtraParams,
    BoundProviderChoices(Vec<String>),
    BoundStandardParams(Schema),
    BoundExtraParams(Vec<ExtraParam>),
}

impl ParamType {
    pub fn scalar(scalar: ScalarType) -> Self {
        Self::Value(ValueType::Scalar(scalar))
    }

    pub fn type_name(&self) -> String {
        match self {
            Self::Value(value) => value.type_name(),
            Self::Context => String::from("CommandContext"),
            Self::ProviderChoices => String::from("ProviderChoices"),
            Self::StandardParams => String::from("StandardParams"),
            Self::ExtraParams => String::from("ExtraParams"),
            Self::BoundProviderChoices(providers) => {
                format!("ProviderChoices[{}]", providers.join(", "))
            }
            Self::BoundStandardParams(schema) => format!("StandardParams[{}]", schema.name),
            Self::BoundExtraParams(_) => String::from("ExtraParams[bound]"),
        }
    }

    /// The abstract reserved type this parameter type satisfies, if any.
    pub fn reserved_kind(&self) -> Option<ReservedKind> {
        match self {
            Self::Value(_) => None,
            Self::Context => Some(ReservedKind::Context),
            Self::ProviderChoices | Self::BoundProviderChoices(_) => {
                Some(ReservedKind::ProviderChoices)
            }
            Self::StandardParams | Self::BoundStandardParams(_) => {
                Some(ReservedKind::StandardParams)
            }
            Self::ExtraParams | Self::BoundExtraParams(_) => Some(ReservedKind::ExtraParams),
        }
    }
}

/// Reserved parameter names and the types they must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedKind {
    Context,
    ProviderChoices,
    StandardParams,
    ExtraParams,
}

impl ReservedKind {
    pub const ALL: [Self; 4] = [
        Self::Context,
        Self::ProviderChoices,
        Self::StandardParams,
        Self::ExtraParams,
    ];

    pub const fn param_name(self) -> &'static str {
        match self {
            Self::Context => "cc",
            Self::ProviderChoices => "provider_choices",
            Self::StandardParams => "standard_params",
            Self::ExtraParams => "extra_params",
        }
    }

    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Context => "CommandContext",
            Self::ProviderChoices => "ProviderChoices",
            Self::StandardParams => "StandardParams",
            Self::ExtraParams => "ExtraParams",
        }
    }

    pub fn from_param_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.param_name() == name)
    }
}

/// Declared return type of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnType {
    /// The response envelope parameterized by its results type.
    Envelope(ValueType),
    /// Anything else, named for error messages.
    Other(String),
}

impl ReturnType {
    pub fn type_name(&self) -> String {
        match self {
            Self::Envelope(results) => format!("Envelope[{}]", results.type_name()),
            Self::Other(name) => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: ParamType,
    pub default: Option<Value>,
    pub description: String,
}

/// Function-like descriptor of one command: where it lives, what it takes, what it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// Dotted module path, first segment being the package.
    pub module: String,
    pub function: String,
    pub doc: String,
    pub params: Vec<Parameter>,
    pub returns: ReturnType,
}

impl Signature {
    pub fn new(module: &str, function: &str) -> Self {
        Self {
            module: module.to_owned(),
            function: function.to_owned(),
            doc: String::new(),
            params: Vec::new(),
            returns: ReturnType::Envelope(ValueType::Json),
        }
    }

    /// `cc`, `provider_choices`, `standard_params` and `extra_params` with their
    /// abstract types, returning an envelope of records.
    pub fn model_command(module: &str, function: &str) -> Self {
        Self::new(module, function)
            .param("cc", ParamType::Context)
            .param("provider_choices", ParamType::ProviderChoices)
            .param("standard_params", ParamType::StandardParams)
            .param("extra_params", ParamType::ExtraParams)
            .returns(ReturnType::Envelope(ValueType::Record))
    }

    pub fn doc(mut self, doc: &str) -> Self {
        self.doc = doc.to_owned();
        self
    }

    pub fn param(mut self, name: &str, ty: ParamType) -> Self {
        self.params.push(Parameter {
            name: name.to_owned(),
            ty,
            default: None,
            description: String::new(),
        });
        self
    }

    pub fn param_with_default(mut self, name: &str, ty: ParamType, default: impl Into<Value>) -> Self {
        self.params.push(Parameter {
            name: name.to_owned(),
            ty,
            default: Some(default.into()),
            description: String::new(),
        });
        self
    }

    pub fn returns(mut self, returns: ReturnType) -> Self {
        self.returns = returns;
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|param| param.name == name)
    }

    pub(crate) fn parameter_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|param| param.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_render_nested_containers() {
        let ty = ValueType::one_or_many(ValueType::Scalar(ScalarType::Str));
        assert_eq!(ty.type_name(), "Union[List[str], str]");
        assert_eq!(
            ReturnType::Envelope(ValueType::list(ValueType::Record)).type_name(),
            "Envelope[List[Record]]"
        );
    }

    #[test]
    fn opaque_types_are_not_serializable() {
        assert!(!ValueType::list(ValueType::Opaque(String::from("FileHandle"))).is_serializable());
        assert!(ValueType::optional(ValueType::Scalar(ScalarType::Date)).is_serializable());
    }

    #[test]
    fn bound_reserved_types_keep_their_kind() {
        assert_eq!(
            ParamType::BoundProviderChoices(vec![String::from("fmp")]).reserved_kind(),
            Some(ReservedKind::ProviderChoices)
        );
        assert_eq!(ReservedKind::from_param_name("cc"), Some(ReservedKind::Context));
        assert_eq!(ReservedKind::from_param_name("symbol"), None);
    }
}
