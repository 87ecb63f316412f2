//! Method tables for the two exposed services.
//!
//! Both services share one RPC namespace. The user database table is
//! consulted first, so its `get_user` shadows the authentication service's.

use crate::error::DispatchError;
use crate::params::Params;
use crate::router::MethodTable;
use srpc_identity_core::{
    AuthenticationService, Credentials, IdentityError, Token, User, UserDatabase,
};
use std::sync::Arc;
use std::time::Duration;

pub const USER_DATABASE_SERVICE: &str = "user_database";
pub const AUTHENTICATION_SERVICE: &str = "authentication";

pub fn user_database_methods<D>(user_database: Arc<D>) -> MethodTable
where
    D: UserDatabase<Error = IdentityError> + 'static,
{
    let mut table = MethodTable::new(USER_DATABASE_SERVICE);

    let db = user_database.clone();
    table.register("add_user", move |params: Params| {
        let db = db.clone();
        async move {
            params.expect_at_most(1)?;
            let user: User = params.required(0)?;
            db.add_user(user).await?;
            Ok::<_, DispatchError>(())
        }
    });

    let db = user_database.clone();
    table.register("get_user", move |params: Params| {
        let db = db.clone();
        async move {
            // A token passed positionally is accepted and ignored; the gate
            // only looks at request metadata.
            params.expect_at_most(2)?;
            let id: String = params.required(0)?;
            let _token: Option<Token> = params.optional(1)?;
            Ok::<_, DispatchError>(db.get_user(&id).await?)
        }
    });

    let db = user_database;
    table.register("check_password", move |params: Params| {
        let db = db.clone();
        async move {
            params.expect_at_most(1)?;
            let credentials: Credentials = params.required(0)?;
            Ok::<_, DispatchError>(db.check_password(&credentials).await?)
        }
    });

    table
}

pub fn authentication_methods<A>(auth: Arc<A>) -> MethodTable
where
    A: AuthenticationService<Error = IdentityError> + 'static,
{
    let mut table = MethodTable::new(AUTHENTICATION_SERVICE);

    let service = auth.clone();
    table.register("authenticate", move |params: Params| {
        let service = service.clone();
        async move {
            params.expect_at_most(2)?;
            let credentials: Credentials = params.required(0)?;
            let duration: Option<Duration> = params.optional(1)?;
            Ok::<_, DispatchError>(service.authenticate(&credentials, duration).await?)
        }
    });

    let service = auth.clone();
    table.register("validate_token", move |params: Params| {
        let service = service.clone();
        async move {
            params.expect_at_most(1)?;
            let valid = match params.lenient::<Token>(0) {
                Some(token) => service.validate_token(&token).await?,
                None => false,
            };
            Ok::<_, DispatchError>(valid)
        }
    });

    let service = auth;
    table.register("get_user", move |params: Params| {
        let service = service.clone();
        async move {
            params.expect_at_most(2)?;
            let id: String = params.required(0)?;
            let token: Option<Token> = params.optional(1)?;
            Ok::<_, DispatchError>(service.get_user_with_token(&id, token.as_ref()).await?)
        }
    });

    table
}
