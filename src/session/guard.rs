// Route guards: loading, login redirect or render for a protected subtree

use std::marker::PhantomData;

use crate::auth::models::{Identity, Role};
use crate::auth::rbac::RoleSet;
use crate::session::{domain::SessionDomain, store::SessionStore};

/// Where a guarded subtree stands with respect to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    Unauthenticated,
    AuthenticatedWrongRole,
    AuthenticatedOk,
}

/// What the client should do for the current route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    ShowLoading,
    Redirect(&'static str),
    Render,
}

/// Snapshot of the session fields a guard reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardInput {
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub role: Option<Role>,
    pub requires_password_change: bool,
}

impl GuardInput {
    pub fn from_session<D: SessionDomain>(store: &SessionStore<D>) -> Self {
        Self {
            is_loading: store.is_loading(),
            is_authenticated: store.is_authenticated(),
            role: store.identity().map(|identity| identity.role()),
            requires_password_change: store.requires_password_change(),
        }
    }
}

/// Classify a session snapshot against the roles a subtree permits
pub fn classify(input: &GuardInput, permitted: &RoleSet) -> GuardState {
    if input.is_loading {
        return GuardState::Loading;
    }
    if !input.is_authenticated {
        return GuardState::Unauthenticated;
    }
    match input.role {
        Some(role) if permitted.contains(role) => GuardState::AuthenticatedOk,
        _ => GuardState::AuthenticatedWrongRole,
    }
}

/// Decide for one route.
///
/// Precedence: loading, then unauthenticated, then wrong role, then the
/// forced credentials redirect, then content.
pub fn decide(
    input: &GuardInput,
    permitted: &RoleSet,
    login_route: &'static str,
    credentials_route: Option<&'static str>,
    current_route: &str,
) -> GuardDecision {
    match classify(input, permitted) {
        GuardState::Loading => GuardDecision::ShowLoading,
        GuardState::Unauthenticated | GuardState::AuthenticatedWrongRole => {
            GuardDecision::Redirect(login_route)
        }
        GuardState::AuthenticatedOk => match credentials_route {
            Some(route) if input.requires_password_change && route_path(current_route) != route => {
                GuardDecision::Redirect(route)
            }
            _ => GuardDecision::Render,
        },
    }
}

// Drops query string and fragment
fn route_path(route: &str) -> &str {
    route.split(['?', '#']).next().unwrap_or(route)
}

/// Route guard for one domain's protected subtree
#[derive(Debug, Clone)]
pub struct RouteGuard<D: SessionDomain> {
    permitted: RoleSet,
    _domain: PhantomData<D>,
}

impl<D: SessionDomain> RouteGuard<D> {
    /// Guard permitting the domain's whole valid-role set
    pub fn new() -> Self {
        Self::with_permitted_roles(D::valid_roles())
    }

    /// Guard for a subtree narrower than the domain, e.g. super-admin pages
    pub fn with_permitted_roles(permitted: RoleSet) -> Self {
        Self {
            permitted,
            _domain: PhantomData,
        }
    }

    pub fn permitted(&self) -> &RoleSet {
        &self.permitted
    }

    pub fn state(&self, store: &SessionStore<D>) -> GuardState {
        classify(&GuardInput::from_session(store), &self.permitted)
    }

    pub fn evaluate(&self, store: &SessionStore<D>, current_route: &str) -> GuardDecision {
        let decision = decide(
            &GuardInput::from_session(store),
            &self.permitted,
            D::LOGIN_ROUTE,
            D::CREDENTIALS_ROUTE,
            current_route,
        );
        tracing::debug!("{} guard on {}: {:?}", D::NAME, current_route, decision);
        decision
    }
}

impl<D: SessionDomain> Default for RouteGuard<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{AdminIdentity, UserIdentity};
    use crate::session::domain::{AdminDomain, EndUserDomain};
    use crate::session::storage::MemoryStorage;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn user(role: Role, force: bool) -> UserIdentity {
        UserIdentity {
            id: 11,
            name: "Meera".to_string(),
            email: "meera@example.com".to_string(),
            role,
            force_password_change: force,
        }
    }

    fn admin(role: Role) -> AdminIdentity {
        AdminIdentity {
            id: 3,
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_no_token_loads_then_redirects_end_user() {
        let mut store = SessionStore::<EndUserDomain>::new(Arc::new(MemoryStorage::new()));
        let guard = RouteGuard::<EndUserDomain>::new();

        assert_eq!(guard.evaluate(&store, "/profile"), GuardDecision::ShowLoading);
        store.initialize().await;
        assert_eq!(guard.state(&store), GuardState::Unauthenticated);
        assert_eq!(guard.evaluate(&store, "/profile"), GuardDecision::Redirect("/login"));
    }

    #[tokio::test]
    async fn test_no_token_loads_then_redirects_admin() {
        let mut store = SessionStore::<AdminDomain>::new(Arc::new(MemoryStorage::new()));
        let guard = RouteGuard::<AdminDomain>::new();

        assert_eq!(guard.evaluate(&store, "/admin"), GuardDecision::ShowLoading);
        store.initialize().await;
        assert_eq!(guard.evaluate(&store, "/admin"), GuardDecision::Redirect("/admin/login"));
    }

    #[tokio::test]
    async fn test_forced_password_change_redirects_to_account() {
        let mut store = SessionStore::<EndUserDomain>::new(Arc::new(MemoryStorage::new()));
        store.initialize().await;
        store.login("tok", user(Role::User, true)).await.unwrap();
        let guard = RouteGuard::<EndUserDomain>::new();

        assert_eq!(guard.evaluate(&store, "/profile"), GuardDecision::Redirect("/account"));
        assert_eq!(guard.evaluate(&store, "/account"), GuardDecision::Render);
        assert_eq!(guard.evaluate(&store, "/account?tab=security"), GuardDecision::Render);

        store.clear_password_change_requirement().await.unwrap();
        assert_eq!(guard.evaluate(&store, "/profile"), GuardDecision::Render);
    }

    #[tokio::test]
    async fn test_admin_domain_ignores_credentials_flag() {
        let mut store = SessionStore::<AdminDomain>::new(Arc::new(MemoryStorage::new()));
        store.initialize().await;
        store.login("tok", admin(Role::Coach)).await.unwrap();

        let guard = RouteGuard::<AdminDomain>::new();
        assert_eq!(guard.state(&store), GuardState::AuthenticatedOk);
        assert_eq!(guard.evaluate(&store, "/admin/practices"), GuardDecision::Render);
    }

    #[tokio::test]
    async fn test_narrow_subtree_redirects_wrong_role() {
        let mut store = SessionStore::<AdminDomain>::new(Arc::new(MemoryStorage::new()));
        store.initialize().await;
        store.login("tok", admin(Role::Coach)).await.unwrap();

        let guard = RouteGuard::<AdminDomain>::with_permitted_roles(RoleSet::super_admin());
        assert_eq!(guard.state(&store), GuardState::AuthenticatedWrongRole);
        assert_eq!(guard.evaluate(&store, "/admin/admins"), GuardDecision::Redirect("/admin/login"));
    }

    #[tokio::test]
    async fn test_stale_identity_with_invalid_role_is_unauthenticated() {
        let mut store = SessionStore::<AdminDomain>::new(Arc::new(MemoryStorage::new()));
        store.initialize().await;
        store.login("tok", admin(Role::User)).await.unwrap();

        let guard = RouteGuard::<AdminDomain>::new();
        assert_eq!(guard.state(&store), GuardState::Unauthenticated);
        assert_eq!(guard.evaluate(&store, "/admin"), GuardDecision::Redirect("/admin/login"));
    }

    #[test]
    fn test_route_path_strips_query_and_fragment() {
        assert_eq!(route_path("/account?x=1"), "/account");
        assert_eq!(route_path("/account#top"), "/account");
        assert_eq!(route_path("/account"), "/account");
    }

    fn role_strategy() -> impl Strategy<Value = Option<Role>> {
        prop_oneof![
            Just(None),
            Just(Some(Role::User)),
            Just(Some(Role::Coach)),
            Just(Some(Role::SuperAdmin)),
        ]
    }

    proptest! {
        #[test]
        fn prop_loading_never_redirects(
            is_authenticated in any::<bool>(),
            role in role_strategy(),
            force in any::<bool>(),
        ) {
            let input = GuardInput {
                is_loading: true,
                is_authenticated,
                role,
                requires_password_change: force,
            };
            let decision = decide(&input, &RoleSet::end_user(), "/login", Some("/account"), "/profile");
            prop_assert_eq!(decision, GuardDecision::ShowLoading);
        }

        #[test]
        fn prop_unauthenticated_always_goes_to_login(
            role in role_strategy(),
            force in any::<bool>(),
        ) {
            let input = GuardInput {
                is_loading: false,
                is_authenticated: false,
                role,
                requires_password_change: force,
            };
            let decision = decide(&input, &RoleSet::end_user(), "/login", Some("/account"), "/profile");
            prop_assert_eq!(decision, GuardDecision::Redirect("/login"));
        }
    }
}
