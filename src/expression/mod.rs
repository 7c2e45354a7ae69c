//! Deferred Earth Engine computation graphs.
//!
//! Nothing in this module talks to the network. A [`Value`] is an immutable
//! description of a remote computation; callers compose values through the
//! typed wrappers in [`types`] and hand the finished graph to an export
//! backend, which encodes it with [`Expression::encode`].

mod encode;
pub mod types;

use std::collections::BTreeMap;

pub use encode::{Expression, ValueNode};
pub use types::{Filter, FeatureCollection, Image, ImageCollection, Reducer};

/// Node in a deferred computation graph.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Literal JSON value (number, string, boolean, null).
    Constant(serde_json::Value),
    /// Invocation of a named platform algorithm.
    Invocation {
        /// Algorithm name, for example `Image.select`.
        function: String,
        /// Named arguments passed to the algorithm.
        arguments: BTreeMap<String, Self>,
    },
    /// Ordered list of values.
    Array(Vec<Self>),
    /// String-keyed map of values.
    Dictionary(BTreeMap<String, Self>),
    /// Anonymous function, used for per-element mapping.
    Function {
        /// Names bound inside `body` through [`Value::Argument`].
        parameters: Vec<String>,
        /// Function body.
        body: Box<Self>,
    },
    /// Reference to a parameter of the enclosing [`Value::Function`].
    Argument(String),
}

impl Value {
    /// Wraps a string literal.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Constant(serde_json::Value::String(value.into()))
    }

    /// Wraps an integer literal.
    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self::Constant(serde_json::Value::from(value))
    }

    /// Wraps a list of string literals.
    #[must_use]
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Array(values.into_iter().map(Self::string).collect())
    }

    /// Starts an invocation of `function` with no arguments.
    #[must_use]
    pub fn call(function: impl Into<String>) -> Call {
        Call {
            function: function.into(),
            arguments: BTreeMap::new(),
        }
    }

    /// Builds a single-parameter function whose body is produced by `body`.
    ///
    /// The closure receives the [`Value::Argument`] bound to `parameter`.
    #[must_use]
    pub fn lambda(parameter: &str, body: impl FnOnce(Self) -> Self) -> Self {
        let argument = Self::Argument(parameter.to_owned());
        Self::Function {
            parameters: vec![parameter.to_owned()],
            body: Box::new(body(argument)),
        }
    }

    /// Returns the algorithm name when this value is an invocation.
    #[must_use]
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Self::Invocation { function, .. } => Some(function.as_str()),
            _ => None,
        }
    }

    /// Returns the named argument when this value is an invocation.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Invocation { arguments, .. } => arguments.get(name),
            _ => None,
        }
    }

    /// Returns `true` when `function` is invoked anywhere in this graph.
    #[must_use]
    pub fn invokes(&self, function: &str) -> bool {
        match self {
            Self::Constant(_) | Self::Argument(_) => false,
            Self::Invocation {
                function: name,
                arguments,
            } => name == function || arguments.values().any(|arg| arg.invokes(function)),
            Self::Array(items) => items.iter().any(|item| item.invokes(function)),
            Self::Dictionary(entries) => entries.values().any(|entry| entry.invokes(function)),
            Self::Function { body, .. } => body.invokes(function),
        }
    }
}

/// Builder for [`Value::Invocation`].
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    function: String,
    arguments: BTreeMap<String, Value>,
}

impl Call {
    /// Adds a named argument.
    #[must_use]
    pub fn arg(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.to_owned(), value.into());
        self
    }

    /// Finishes the invocation.
    #[must_use]
    pub fn build(self) -> Value {
        Value::Invocation {
            function: self.function,
            arguments: self.arguments,
        }
    }
}

impl From<Call> for Value {
    fn from(value: Call) -> Self {
        value.build()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::integer(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::integer(i64::from(value))
    }
}
