// Session domains: the end-user app and the admin console

use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

use crate::auth::{
    models::{AdminIdentity, Identity, UserIdentity},
    rbac::RoleSet,
};

/// Per-domain parameters for a session store and its route guard.
///
/// Two domains never share storage keys, so their sessions cannot collide.
pub trait SessionDomain: Send + Sync + 'static {
    type Identity: Identity + Serialize + DeserializeOwned + Clone + Debug + Send + Sync;

    const NAME: &'static str;
    const TOKEN_KEY: &'static str;
    const IDENTITY_KEY: &'static str;
    const LOGIN_ROUTE: &'static str;

    /// Route an identity flagged for a credentials change is sent to, if the
    /// domain enforces that at all.
    const CREDENTIALS_ROUTE: Option<&'static str> = None;

    fn valid_roles() -> RoleSet;
}

/// End-user app domain (`USER`, `COACH`)
#[derive(Debug, Clone, Copy)]
pub struct EndUserDomain;

impl SessionDomain for EndUserDomain {
    type Identity = UserIdentity;

    const NAME: &'static str = "end-user";
    const TOKEN_KEY: &'static str = "@app:user_token";
    const IDENTITY_KEY: &'static str = "@app:user";
    const LOGIN_ROUTE: &'static str = "/login";
    const CREDENTIALS_ROUTE: Option<&'static str> = Some("/account");

    fn valid_roles() -> RoleSet {
        RoleSet::end_user()
    }
}

/// Admin console domain (`SUPER_ADMIN`, `COACH`)
#[derive(Debug, Clone, Copy)]
pub struct AdminDomain;

impl SessionDomain for AdminDomain {
    type Identity = AdminIdentity;

    const NAME: &'static str = "admin";
    const TOKEN_KEY: &'static str = "@app:admin_token";
    const IDENTITY_KEY: &'static str = "@app:admin_user";
    const LOGIN_ROUTE: &'static str = "/admin/login";

    fn valid_roles() -> RoleSet {
        RoleSet::admin()
    }
}
