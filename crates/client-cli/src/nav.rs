//! Routes and the navigation link sets.

use std::fmt;

use crate::session::SessionStatus;

/// Client-side routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Welcome,
    Signup,
    Login,
    Account,
    Setup,
    Support,
    Pricing,
    Admin,
}

impl Route {
    pub const ALL: [Route; 8] = [
        Route::Welcome,
        Route::Signup,
        Route::Login,
        Route::Account,
        Route::Setup,
        Route::Support,
        Route::Pricing,
        Route::Admin,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Welcome => "/",
            Route::Signup => "/signup",
            Route::Login => "/login",
            Route::Account => "/account",
            Route::Setup => "/setup",
            Route::Support => "/support",
            Route::Pricing => "/pricing",
            Route::Admin => "/admin",
        }
    }

    /// Resolve a path, ignoring any query string and trailing slash
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        Route::ALL.into_iter().find(|r| r.path() == path)
    }

    pub const fn title(&self) -> &'static str {
        match self {
            Route::Welcome => "Home",
            Route::Signup => "Signup",
            Route::Login => "Login",
            Route::Account => "Account",
            Route::Setup => "Setup Guide",
            Route::Support => "Support",
            Route::Pricing => "Pricing",
            Route::Admin => "Admin",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A link in the navigation bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub route: Route,
}

const fn link(route: Route) -> NavLink {
    NavLink {
        label: route.title(),
        route,
    }
}

const COMMON: [NavLink; 4] = [
    link(Route::Welcome),
    link(Route::Pricing),
    link(Route::Support),
    link(Route::Setup),
];

/// Links for the current visitor. Admin links only ever appear when the
/// admin check succeeded.
pub fn links_for(status: SessionStatus) -> Vec<NavLink> {
    let mut links = COMMON.to_vec();
    if !status.authenticated {
        links.push(link(Route::Signup));
        links.push(link(Route::Login));
        return links;
    }
    links.push(link(Route::Account));
    if status.is_admin {
        links.push(link(Route::Admin));
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes(status: SessionStatus) -> Vec<Route> {
        links_for(status).into_iter().map(|l| l.route).collect()
    }

    #[test]
    fn test_parse_round_trips_every_route() {
        for route in Route::ALL {
            assert_eq!(Route::parse(route.path()), Some(route));
        }
        assert_eq!(Route::parse(""), Some(Route::Welcome));
        assert_eq!(Route::parse("/signup?plan=price_1"), Some(Route::Signup));
        assert_eq!(Route::parse("/account/"), Some(Route::Account));
        assert_eq!(Route::parse("/nowhere"), None);
    }

    #[test]
    fn test_guest_links() {
        let r = routes(SessionStatus::GUEST);
        assert!(r.contains(&Route::Signup));
        assert!(r.contains(&Route::Login));
        assert!(!r.contains(&Route::Account));
        assert!(!r.contains(&Route::Admin));
    }

    #[test]
    fn test_member_links_have_no_admin_entry() {
        let r = routes(SessionStatus {
            authenticated: true,
            is_admin: false,
        });
        assert!(r.contains(&Route::Account));
        assert!(!r.contains(&Route::Login));
        assert!(!r.contains(&Route::Admin));
    }

    #[test]
    fn test_admin_links() {
        let r = routes(SessionStatus {
            authenticated: true,
            is_admin: true,
        });
        assert!(r.contains(&Route::Account));
        assert!(r.contains(&Route::Admin));
    }

    #[test]
    fn test_admin_flag_without_session_is_ignored() {
        let r = routes(SessionStatus {
            authenticated: false,
            is_admin: true,
        });
        assert!(!r.contains(&Route::Admin));
    }
}
