//! Field-level contracts shared by standard models and provider models.

use std::collections::BTreeSet;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Number, Value};

use crate::domain::IsoDate;
use crate::ValidationError;

/// Flat key/value parameter set as received from callers.
pub type Params = Map<String, Value>;

/// Wire type of a single schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    Date,
}

impl FieldKind {
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::String => "str",
            Self::Integer => "int",
            Self::Float => "float",
            Self::Boolean => "bool",
            Self::Date => "date",
        }
    }

    const fn json_type(self) -> &'static str {
        match self {
            Self::String | Self::Date => "string",
            Self::Integer => "integer",
            Self::Float => "number",
            Self::Boolean => "boolean",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Date => value
                .as_str()
                .map(|raw| IsoDate::parse(raw).is_ok())
                .unwrap_or(false),
        }
    }

    /// Converts loosely typed caller input (for example CLI strings) into this kind.
    fn coerce(self, field: &str, value: Value) -> Result<Value, ValidationError> {
        let mismatch = |found: &Value| ValidationError::InvalidFieldType {
            field: field.to_owned(),
            expected: self.type_name(),
            found: describe_value(found),
        };

        match (self, value) {
            (Self::String, Value::String(raw)) => Ok(Value::String(raw)),
            (Self::String, Value::Number(number)) => Ok(Value::String(number.to_string())),
            (Self::Integer, Value::Number(number)) if number.is_i64() || number.is_u64() => {
                Ok(Value::Number(number))
            }
            (Self::Integer, Value::String(raw)) => raw
                .trim()
                .parse::<i64>()
                .map(|parsed| Value::Number(parsed.into()))
                .map_err(|_| mismatch(&Value::String(raw))),
            (Self::Float, Value::Number(number)) => Ok(Value::Number(number)),
            (Self::Float, Value::String(raw)) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| mismatch(&Value::String(raw))),
            (Self::Boolean, Value::Bool(flag)) => Ok(Value::Bool(flag)),
            (Self::Boolean, Value::String(raw)) => match raw.trim().to_ascii_lowercase().as_str()
            {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(mismatch(&Value::String(raw))),
            },
            (Self::Date, Value::String(raw)) => IsoDate::parse_field(field, &raw)
                .map(|date| Value::String(date.to_string())),
            (_, other) => Err(mismatch(&other)),
        }
    }
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => String::from("null"),
        Value::Bool(flag) => format!("bool {flag}"),
        Value::Number(number) => format!("number {number}"),
        Value::String(raw) => format!("string '{raw}'"),
        Value::Array(_) => String::from("array"),
        Value::Object(_) => String::from("object"),
    }
}

/// One named, typed field of a query or data schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Field {
    pub fn required(name: &str, kind: FieldKind, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            required: true,
            description: description.to_owned(),
            alias: None,
            default: None,
        }
    }

    pub fn optional(name: &str, kind: FieldKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Upstream key this field is read from.
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_owned());
        self
    }

    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Named, ordered collection of fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(name: &str, fields: Vec<Field>) -> Self {
        Self {
            name: name.to_owned(),
            fields,
        }
    }

    /// Schema of `base` plus `extra` fields, named `name`.
    pub fn extend(name: &str, base: Schema, extra: Vec<Field>) -> Self {
        let mut fields = base.fields;
        fields.extend(extra);
        Self {
            name: name.to_owned(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    /// Structural self-check: non-empty name and unique field names.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: String::from("schema"),
                message: String::from("schema name cannot be empty"),
            });
        }

        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ValidationError::DuplicateField {
                    schema: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Coerces `params` into the declared field kinds and checks required fields.
    ///
    /// Null values are treated as absent. Keys not declared by the schema are rejected.
    pub fn coerce_params(&self, params: &Params) -> Result<Params, ValidationError> {
        if let Some(unknown) = params.keys().find(|key| self.field(key).is_none()) {
            return Err(ValidationError::UnknownParameter {
                name: unknown.clone(),
            });
        }

        let mut coerced = Params::new();
        for field in &self.fields {
            match params.get(&field.name) {
                Some(value) if !value.is_null() => {
                    coerced.insert(field.name.clone(), field.kind.coerce(&field.name, value.clone())?);
                }
                _ if field.required && field.default.is_none() => {
                    return Err(ValidationError::MissingField {
                        field: field.name.clone(),
                    });
                }
                _ => {}
            }
        }
        Ok(coerced)
    }

    /// Checks a produced record: required fields are present and every value has its declared kind.
    pub fn validate_record(&self, record: &Map<String, Value>) -> Result<(), ValidationError> {
        for field in &self.fields {
            match record.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(ValidationError::MissingField {
                        field: field.name.clone(),
                    });
                }
                Some(value) if !value.is_null() && !field.kind.matches(value) => {
                    return Err(ValidationError::InvalidFieldType {
                        field: field.name.clone(),
                        expected: field.kind.type_name(),
                        found: describe_value(value),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Checks that `self` is a conforming extension of `standard`.
    ///
    /// Every standard field must be present with the same kind, and every field `self`
    /// requires must also be required by `standard`, so a value built from the standard
    /// required fields alone is always valid for `self`.
    pub fn check_extends(&self, standard: &Schema) -> Result<(), ValidationError> {
        let incompatible = |reason: String| ValidationError::IncompatibleSchema {
            schema: self.name.clone(),
            standard: standard.name.clone(),
            reason,
        };

        for base in &standard.fields {
            let Some(field) = self.field(&base.name) else {
                return Err(incompatible(format!("missing field '{}'", base.name)));
            };
            if field.kind != base.kind {
                return Err(incompatible(format!(
                    "field '{}' is {} instead of {}",
                    base.name,
                    field.kind.type_name(),
                    base.kind.type_name()
                )));
            }
        }

        for field in &self.fields {
            let standard_requires = standard
                .field(&field.name)
                .map(|base| base.required)
                .unwrap_or(false);
            if field.required && field.default.is_none() && !standard_requires {
                return Err(incompatible(format!(
                    "field '{}' is required but optional in the standard",
                    field.name
                )));
            }
        }
        Ok(())
    }

    /// JSON-schema style description used by route schemas and the CLI.
    pub fn json_schema(&self) -> Value {
        let properties = self
            .fields
            .iter()
            .map(|field| {
                let mut property = json!({
                    "type": field.kind.json_type(),
                    "description": field.description,
                });
                if field.kind == FieldKind::Date {
                    property["format"] = json!("date");
                }
                if let Some(default) = &field.default {
                    property["default"] = default.clone();
                }
                (field.name.clone(), property)
            })
            .collect::<Map<String, Value>>();
        let required = self
            .fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name.clone())
            .collect::<Vec<_>>();

        json!({
            "title": self.name,
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// A serde type with a declared field schema.
pub trait SchemaModel: Serialize + DeserializeOwned + Debug + Clone + Send + Sync + 'static {
    fn schema() -> Schema;

    /// Cross-field checks run after deserialization.
    fn check(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn from_record(record: &Map<String, Value>) -> Result<Self, ValidationError> {
        let value = serde_json::from_value::<Self>(Value::Object(record.clone())).map_err(
            |error| ValidationError::InvalidValue {
                field: Self::schema().name,
                message: error.to_string(),
            },
        )?;
        value.check()?;
        Ok(value)
    }

    fn to_record(&self) -> Result<Map<String, Value>, ValidationError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(record)) => Ok(record),
            Ok(other) => Err(ValidationError::InvalidValue {
                field: Self::schema().name,
                message: format!("expected an object, got {}", describe_value(&other)),
            }),
            Err(error) => Err(ValidationError::InvalidValue {
                field: Self::schema().name,
                message: error.to_string(),
            }),
        }
    }
}

/// Marker for query parameter models.
pub trait QueryParams: SchemaModel {}

/// Marker for result record models.
pub trait Data: SchemaModel {}
