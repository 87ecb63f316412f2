//! Method tables mapping RPC names to handlers.

use crate::error::DispatchResult;
use crate::params::Params;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// Future returned by a boxed method handler
pub type MethodFuture = Pin<Box<dyn Future<Output = DispatchResult<serde_json::Value>> + Send>>;

/// Function type for handling one RPC method
pub type MethodHandler = Box<dyn Fn(Params) -> MethodFuture + Send + Sync>;

/// The methods one service exposes over RPC.
pub struct MethodTable {
    service: String,
    handlers: HashMap<String, MethodHandler>,
}

impl MethodTable {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            handlers: HashMap::new(),
        }
    }

    /// Register a handler whose value is serialized into the response result
    pub fn register<F, Fut, T>(&mut self, method: &str, handler: F)
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<T>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        debug!("Registering {}.{}", self.service, method);
        let boxed_handler: MethodHandler = Box::new(move |params: Params| {
            let call = handler(params);
            Box::pin(async move {
                let value = call.await?;
                Ok(serde_json::to_value(value)?)
            }) as MethodFuture
        });
        self.handlers.insert(method.to_string(), boxed_handler);
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn get(&self, method: &str) -> Option<&MethodHandler> {
        self.handlers.get(method)
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    pub fn methods(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;
    use serde_json::json;

    #[tokio::test]
    async fn test_table_registration_and_call() {
        let mut table = MethodTable::new("echo");
        table.register("echo", |params: Params| async move {
            let text: String = params.required(0)?;
            Ok::<_, DispatchError>(text)
        });

        assert!(table.has_method("echo"));
        assert!(!table.has_method("unknown"));
        assert_eq!(table.methods(), vec!["echo".to_string()]);

        let handler = table.get("echo").unwrap();
        let value = handler(Params::new("echo", vec![json!("hello")]))
            .await
            .unwrap();
        assert_eq!(value, json!("hello"));
    }

    #[tokio::test]
    async fn test_unit_result_is_null() {
        let mut table = MethodTable::new("noop");
        table.register("noop", |_params: Params| async move { Ok::<_, DispatchError>(()) });

        let value = table.get("noop").unwrap()(Params::new("noop", vec![]))
            .await
            .unwrap();
        assert_eq!(value, serde_json::Value::Null);
    }
}
