//! Serde shapes of the YAML input files.
//!
//! These mirror the files as written. Nested specs inside groups are kept as
//! [`Value`]s so that inline type definitions retain their raw mapping.

use serde::Deserialize;
use serde_yaml::Value;

#[derive(Debug, Deserialize)]
pub(crate) struct RawNamespaceFile {
    pub namespaces: Vec<RawNamespace>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawNamespace {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub version: Option<Value>,
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub author: OneOrMany,
    #[serde(default)]
    pub contact: OneOrMany,
    #[serde(default)]
    pub schema: Vec<RawSchemaEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawSchemaEntry {
    Source {
        source: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        doc: Option<String>,
    },
    Import {
        namespace: String,
    },
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawSourceFile {
    #[serde(default)]
    pub groups: Vec<Value>,
    #[serde(default)]
    pub datasets: Vec<Value>,
}

/// A group or dataset spec.
#[derive(Debug, Deserialize)]
pub(crate) struct RawSpec {
    #[serde(default, alias = "neurodata_type_def")]
    pub data_type_def: Option<String>,
    #[serde(default, alias = "neurodata_type_inc")]
    pub data_type_inc: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub default_name: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub quantity: Option<RawQuantity>,
    #[serde(default)]
    pub linkable: Option<bool>,
    #[serde(default)]
    pub dtype: Option<RawDType>,
    #[serde(default)]
    pub dims: Option<Value>,
    #[serde(default)]
    pub shape: Option<Value>,
    #[serde(default)]
    pub attributes: Vec<RawAttribute>,
    #[serde(default)]
    pub datasets: Vec<Value>,
    #[serde(default)]
    pub groups: Vec<Value>,
    #[serde(default)]
    pub links: Vec<RawLink>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAttribute {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub dtype: Option<RawDType>,
    #[serde(default)]
    pub dims: Option<Value>,
    #[serde(default)]
    pub shape: Option<Value>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub default_value: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawLink {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
    pub target_type: String,
    #[serde(default)]
    pub quantity: Option<RawQuantity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawDType {
    Name(String),
    Reference(RawReference),
    Compound(Vec<RawCompoundField>),
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawReference {
    pub target_type: String,
    #[serde(default = "default_reftype")]
    pub reftype: String,
}

fn default_reftype() -> String {
    "object".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCompoundField {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    pub dtype: RawDType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawQuantity {
    Count(u64),
    Symbol(String),
}

/// Render a YAML value the way it reads in documentation.
///
/// Scalars render bare; sequences render as `['a', None, 3]`.
pub(crate) fn display_value(value: &Value) -> String {
    fn nested(value: &Value) -> String {
        match value {
            Value::String(text) => format!("'{text}'"),
            other => display_value(other),
        }
    }

    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Sequence(items) => {
            let items: Vec<String> = items.iter().map(nested).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Mapping(mapping) => {
            let entries: Vec<String> = mapping
                .iter()
                .map(|(key, value)| format!("{}: {}", nested(key), nested(value)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Value::Tagged(tagged) => display_value(&tagged.value),
    }
}
