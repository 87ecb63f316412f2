//! Request dispatch: authorize, resolve, invoke.

use crate::error::{DispatchError, DispatchResult};
use crate::methods::{authentication_methods, user_database_methods};
use crate::params::Params;
use crate::policy::AuthorizationPolicy;
use crate::router::{MethodHandler, MethodTable};
use srpc_identity_core::{AuthenticationService, IdentityError, UserDatabase};
use srpc_rpc_types::{Request, Response};
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns one [`Request`] into one [`Response`].
///
/// Authorization runs before resolution, so an unauthorized call to a secure
/// method is denied even if its arguments are bad.
pub struct RequestDispatcher {
    policy: AuthorizationPolicy,
    validator: Arc<dyn AuthenticationService<Error = IdentityError>>,
    tables: Vec<MethodTable>,
}

impl RequestDispatcher {
    pub fn new<D, A>(user_database: Arc<D>, auth: Arc<A>, policy: AuthorizationPolicy) -> Self
    where
        D: UserDatabase<Error = IdentityError> + 'static,
        A: AuthenticationService<Error = IdentityError> + 'static,
    {
        let tables = vec![
            user_database_methods(user_database),
            authentication_methods(auth.clone()),
        ];

        Self {
            policy,
            validator: auth,
            tables,
        }
    }

    pub fn policy(&self) -> &AuthorizationPolicy {
        &self.policy
    }

    /// Finds the handler for `method`, searching the tables in order.
    pub fn resolve(&self, method: &str) -> Option<(&str, &MethodHandler)> {
        self.tables
            .iter()
            .find_map(|table| table.get(method).map(|handler| (table.service(), handler)))
    }

    pub fn methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.tables.iter().flat_map(|t| t.methods()).collect();
        methods.sort();
        methods.dedup();
        methods
    }

    /// Never fails: every error is carried in the returned response.
    pub async fn dispatch(&self, request: Request) -> Response {
        let method = request.name.clone();
        match self.try_dispatch(request).await {
            Ok(value) => Response::success(value),
            Err(e) => {
                match &e {
                    DispatchError::Identity(_) | DispatchError::Serialization(_) => {
                        debug!(method = %method, error = %e, "Call failed");
                    }
                    _ => warn!(method = %method, error = %e, "Call rejected"),
                }
                Response::failure(e.kind(), e.to_string())
            }
        }
    }

    async fn try_dispatch(&self, request: Request) -> DispatchResult<serde_json::Value> {
        let Request {
            name,
            args,
            metadata,
        } = request;

        self.policy
            .authorize(&name, metadata.as_ref(), self.validator.as_ref())
            .await?;

        let (service, handler) = self
            .resolve(&name)
            .ok_or_else(|| DispatchError::MethodNotFound(name.clone()))?;
        debug!("Invoking {}.{} with {} args", service, name, args.len());

        handler(Params::new(name, args)).await
    }
}
