//! Positional argument access for method handlers.

use crate::error::{DispatchError, DispatchResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The positional arguments of one call.
#[derive(Debug, Clone)]
pub struct Params {
    method: String,
    args: Vec<Value>,
}

impl Params {
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Fails if more than `max` arguments were passed.
    pub fn expect_at_most(&self, max: usize) -> DispatchResult<()> {
        if self.args.len() > max {
            return Err(DispatchError::invalid_params(
                &self.method,
                format!("expected at most {} arguments, got {}", max, self.args.len()),
            ));
        }
        Ok(())
    }

    /// Decodes the argument at `index`, failing if it is missing or malformed.
    pub fn required<T: DeserializeOwned>(&self, index: usize) -> DispatchResult<T> {
        let value = self.args.get(index).ok_or_else(|| {
            DispatchError::invalid_params(&self.method, format!("missing argument {}", index))
        })?;
        self.decode(index, value)
    }

    /// Decodes the argument at `index`; a missing argument or `null` is `None`.
    pub fn optional<T: DeserializeOwned>(&self, index: usize) -> DispatchResult<Option<T>> {
        match self.args.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => self.decode(index, value).map(Some),
        }
    }

    /// Like [`Params::optional`], but a malformed argument is also `None`.
    pub fn lenient<T: DeserializeOwned>(&self, index: usize) -> Option<T> {
        self.optional(index).ok().flatten()
    }

    fn decode<T: DeserializeOwned>(&self, index: usize, value: &Value) -> DispatchResult<T> {
        serde_json::from_value(value.clone()).map_err(|e| {
            DispatchError::invalid_params(&self.method, format!("argument {}: {}", index, e))
        })
    }
}
