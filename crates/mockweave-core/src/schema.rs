use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::options::SchemaOptions;

/// Any position in the generation tree: a typed node or a bare literal.
///
/// Bare strings starting with `ref:` are reference shorthands resolved at
/// generation time; every other literal is emitted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Schema {
    Node(Box<SchemaNode>),
    Literal(Literal),
}

impl Schema {
    /// Decode a JSON document into the schema model.
    pub fn from_json(value: &Value) -> Result<Schema> {
        Ok(Schema::deserialize(value)?)
    }

    pub fn as_node(&self) -> Option<&SchemaNode> {
        match self {
            Schema::Node(node) => Some(node),
            Schema::Literal(_) => None,
        }
    }

    /// Options declared directly on this position, if any.
    pub fn options(&self) -> Option<&SchemaOptions> {
        self.as_node().and_then(|node| node.common().options.as_ref())
    }
}

/// A bare `string | number | boolean | null` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(value) => Value::Bool(*value),
            Literal::Number(value) => Value::Number(value.clone()),
            Literal::String(value) => Value::String(value.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Typed generation node, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SchemaNode {
    Number(NumberNode),
    Boolean(BooleanNode),
    Date(DateNode),
    String(StringNode),
    Array(ArrayNode),
    Object(ObjectNode),
    OneOf(OneOfNode),
    Reference(ReferenceNode),
    Plugin(PluginNode),
}

impl SchemaNode {
    /// Fields shared by every node kind.
    pub fn common(&self) -> &NodeOptions {
        match self {
            SchemaNode::Number(node) => &node.common,
            SchemaNode::Boolean(node) => &node.common,
            SchemaNode::Date(node) => &node.common,
            SchemaNode::String(node) => &node.common,
            SchemaNode::Array(node) => &node.common,
            SchemaNode::Object(node) => &node.common,
            SchemaNode::OneOf(node) => &node.common,
            SchemaNode::Reference(node) => &node.common,
            SchemaNode::Plugin(node) => &node.common,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SchemaNode::Number(_) => "number",
            SchemaNode::Boolean(_) => "boolean",
            SchemaNode::Date(_) => "date",
            SchemaNode::String(_) => "string",
            SchemaNode::Array(_) => "array",
            SchemaNode::Object(_) => "object",
            SchemaNode::OneOf(_) => "oneOf",
            SchemaNode::Reference(_) => "reference",
            SchemaNode::Plugin(_) => "plugin",
        }
    }

    /// True when the node always yields the same value.
    pub fn is_constant(&self) -> bool {
        match self {
            SchemaNode::Number(node) => node.value.is_some(),
            SchemaNode::Boolean(node) => node.value.is_some() && node.chance.is_none(),
            SchemaNode::Date(node) => node.value.is_some(),
            SchemaNode::String(node) => node
                .value
                .as_deref()
                .is_some_and(|value| !value.starts_with(crate::REF_PREFIX)),
            _ => false,
        }
    }
}

/// Common fields available on every node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeOptions {
    /// The node may be left unset.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    /// Values must be distinct across the node's normalized path.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
    /// Probability that an optional node is left unset. Defaults to 0.5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0, max = 1))]
    pub chance_unset: Option<f64>,
    /// Plugin whose `transform` capability post-processes the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    /// Arguments passed to the transform plugin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_args: Option<Value>,
    /// Options overriding the inherited ones for this subtree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<SchemaOptions>,
}

impl NodeOptions {
    pub fn chance_unset(&self) -> f64 {
        self.chance_unset.unwrap_or(0.5)
    }
}

/// Number node: constant `value` or a random draw in `[min, max]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NumberNode {
    #[serde(flatten)]
    pub common: NodeOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Restrict random values to `min + k * step`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u32>,
}

/// Boolean node: `chance` of being true, or a constant `value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BooleanNode {
    #[serde(flatten)]
    pub common: NodeOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0, max = 1))]
    pub chance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<bool>,
}

/// Date node: constant `value` or a random instant between `min` and `max`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateNode {
    #[serde(flatten)]
    pub common: NodeOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

/// String node: literal (or `ref:`) `value`, or a named `generator`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StringNode {
    #[serde(flatten)]
    pub common: NodeOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<StringGenerator>,
}

/// Built-in string providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StringGenerator {
    Uuid,
    Address,
    Email(EmailGenerator),
    FirstName,
    LastName,
    FullName,
    CompanyName,
    Website,
    PhoneNumber,
    Country,
    City,
    ZipCode,
    Latitude,
    Longitude,
    Color,
    Title,
    Username(UsernameGenerator),
    Format(FormatGenerator),
    Password(PasswordGenerator),
}

impl StringGenerator {
    pub fn kind(&self) -> &'static str {
        match self {
            StringGenerator::Uuid => "uuid",
            StringGenerator::Address => "address",
            StringGenerator::Email(_) => "email",
            StringGenerator::FirstName => "firstName",
            StringGenerator::LastName => "lastName",
            StringGenerator::FullName => "fullName",
            StringGenerator::CompanyName => "companyName",
            StringGenerator::Website => "website",
            StringGenerator::PhoneNumber => "phoneNumber",
            StringGenerator::Country => "country",
            StringGenerator::City => "city",
            StringGenerator::ZipCode => "zipCode",
            StringGenerator::Latitude => "latitude",
            StringGenerator::Longitude => "longitude",
            StringGenerator::Color => "color",
            StringGenerator::Title => "title",
            StringGenerator::Username(_) => "username",
            StringGenerator::Format(_) => "format",
            StringGenerator::Password(_) => "password",
        }
    }
}

/// Email parameters; each may be a literal or a `ref:` expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailGenerator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Username parameters; each may be a literal or a `ref:` expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsernameGenerator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Template with 1-indexed `{n}` placeholders into `args`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormatGenerator {
    pub format: String,
    #[serde(default)]
    pub args: Vec<Schema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PasswordGenerator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
}

/// Array node: `length` elements generated from `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArrayNode {
    #[serde(flatten)]
    pub common: NodeOptions,
    pub length: ArrayLength,
    pub items: Schema,
}

/// Array length: a bare integer, `{value}`, or a random `{min, max, step}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ArrayLength {
    Fixed(i64),
    Constant(ConstantLength),
    Random(RandomLength),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConstantLength {
    pub value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RandomLength {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// Object node; properties are generated in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectNode {
    #[serde(flatten)]
    pub common: NodeOptions,
    pub properties: IndexMap<String, Schema>,
}

/// Choice node: one element picked uniformly at random.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OneOfNode {
    #[serde(flatten)]
    pub common: NodeOptions,
    pub elements: Vec<Schema>,
}

/// Reference node: pick one pooled value of `ref`, minus `except`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceNode {
    #[serde(flatten)]
    pub common: NodeOptions,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub except: Option<Vec<Literal>>,
}

/// Plugin node: evaluates to the plugin's `generate(args)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PluginNode {
    #[serde(flatten)]
    pub common: NodeOptions,
    pub plugin_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_document_in_declaration_order() {
        let doc = json!({
            "type": "object",
            "options": {"ignoreNotFoundLocalRefs": true},
            "properties": {
                "zeta": {"type": "string", "value": "z"},
                "alpha": {"type": "number", "min": 1, "max": 2, "optional": true},
                "ref": "ref:./zeta"
            }
        });

        let schema = Schema::from_json(&doc).expect("parse document");
        let Some(SchemaNode::Object(object)) = schema.as_node() else {
            panic!("expected object node");
        };
        let keys: Vec<&str> = object.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "ref"]);
        assert!(schema.options().is_some());
        assert!(matches!(
            object.properties.get("ref"),
            Some(Schema::Literal(Literal::String(value))) if value == "ref:./zeta"
        ));
        let Some(SchemaNode::Number(number)) = object.properties["alpha"].as_node() else {
            panic!("expected number node");
        };
        assert!(number.common.optional);
        assert_eq!(number.min, Some(1.0));
    }

    #[test]
    fn parses_array_length_variants() {
        let fixed: ArrayLength = serde_json::from_value(json!(3)).expect("fixed");
        let constant: ArrayLength = serde_json::from_value(json!({"value": 2})).expect("constant");
        let random: ArrayLength =
            serde_json::from_value(json!({"min": 1, "max": 5})).expect("random");
        assert_eq!(fixed, ArrayLength::Fixed(3));
        assert_eq!(constant, ArrayLength::Constant(ConstantLength { value: 2 }));
        assert!(matches!(random, ArrayLength::Random(RandomLength { min: Some(_), .. })));
    }

    #[test]
    fn parses_string_generators() {
        let doc = json!({
            "type": "string",
            "generator": {"type": "email", "firstName": "ref:./first", "domain": "example.com"}
        });
        let schema = Schema::from_json(&doc).expect("parse string node");
        let Some(SchemaNode::String(node)) = schema.as_node() else {
            panic!("expected string node");
        };
        match &node.generator {
            Some(StringGenerator::Email(email)) => {
                assert_eq!(email.first_name.as_deref(), Some("ref:./first"));
                assert_eq!(email.domain.as_deref(), Some("example.com"));
                assert!(email.last_name.is_none());
            }
            other => panic!("unexpected generator {other:?}"),
        }
    }

    #[test]
    fn constant_detection_ignores_references() {
        let constant = Schema::from_json(&json!({"type": "string", "value": "x"})).unwrap();
        let reference = Schema::from_json(&json!({"type": "string", "value": "ref:a"})).unwrap();
        assert!(constant.as_node().unwrap().is_constant());
        assert!(!reference.as_node().unwrap().is_constant());
    }
}
