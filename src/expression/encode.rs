//! Wire encoding of computation graphs for the Earth Engine REST API.
//!
//! The API expects an `Expression` message: a table of value nodes plus the
//! key of the result node. Function bodies must live in the table and are
//! referenced by key, so the encoder hoists every [`Value::Function`] body
//! into its own entry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Value;

/// Encoded computation graph ready to embed in a request body.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Expression {
    /// Key of the node holding the final result.
    pub result: String,
    /// Value table keyed by node id.
    pub values: BTreeMap<String, ValueNode>,
}

/// One node of an encoded [`Expression`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum ValueNode {
    /// Literal value.
    #[serde(rename = "constantValue")]
    Constant(serde_json::Value),
    /// Ordered list of nodes.
    #[serde(rename = "arrayValue")]
    Array {
        /// List items.
        values: Vec<Self>,
    },
    /// String-keyed map of nodes.
    #[serde(rename = "dictionaryValue")]
    Dictionary {
        /// Map entries.
        values: BTreeMap<String, Self>,
    },
    /// Function definition whose body lives in the value table.
    #[serde(rename = "functionDefinitionValue")]
    FunctionDefinition {
        /// Parameter names.
        #[serde(rename = "argumentNames")]
        argument_names: Vec<String>,
        /// Key of the body node.
        body: String,
    },
    /// Invocation of a named algorithm.
    #[serde(rename = "functionInvocationValue")]
    FunctionInvocation {
        /// Algorithm name.
        #[serde(rename = "functionName")]
        function_name: String,
        /// Named arguments.
        arguments: BTreeMap<String, Self>,
    },
    /// Reference to a function parameter.
    #[serde(rename = "argumentReference")]
    ArgumentReference(String),
    /// Reference to another entry of the value table.
    #[serde(rename = "valueReference")]
    ValueReference(String),
}

impl Expression {
    /// Encodes `value` into the wire form.
    #[must_use]
    pub fn encode(value: &Value) -> Self {
        let mut encoder = Encoder::default();
        let root = encoder.node(value);
        let result = encoder.insert(root);
        Self {
            result,
            values: encoder.values,
        }
    }

    /// Returns the result node.
    #[must_use]
    pub fn root(&self) -> Option<&ValueNode> {
        self.values.get(&self.result)
    }
}

#[derive(Default)]
struct Encoder {
    values: BTreeMap<String, ValueNode>,
    next_id: usize,
}

impl Encoder {
    fn insert(&mut self, node: ValueNode) -> String {
        let key = self.next_id.to_string();
        self.next_id += 1;
        self.values.insert(key.clone(), node);
        key
    }

    fn node(&mut self, value: &Value) -> ValueNode {
        match value {
            Value::Constant(constant) => ValueNode::Constant(constant.clone()),
            Value::Invocation {
                function,
                arguments,
            } => ValueNode::FunctionInvocation {
                function_name: function.clone(),
                arguments: arguments
                    .iter()
                    .map(|(name, arg)| (name.clone(), self.node(arg)))
                    .collect(),
            },
            Value::Array(items) => ValueNode::Array {
                values: items.iter().map(|item| self.node(item)).collect(),
            },
            Value::Dictionary(entries) => ValueNode::Dictionary {
                values: entries
                    .iter()
                    .map(|(key, entry)| (key.clone(), self.node(entry)))
                    .collect(),
            },
            Value::Function { parameters, body } => {
                let body_node = self.node(body);
                ValueNode::FunctionDefinition {
                    argument_names: parameters.clone(),
                    body: self.insert(body_node),
                }
            }
            Value::Argument(name) => ValueNode::ArgumentReference(name.clone()),
        }
    }
}
