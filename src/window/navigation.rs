use url::{Origin, Url};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Stay in the privileged window.
    Allow,
    /// Cancel the navigation and hand the URL to the system browser.
    OpenExternal,
}

/// Origin pin for the privileged window.
///
/// The window's content origin must never silently change: that is the
/// precondition under which one tenant, one partition and one capability
/// scope stay aligned for the process lifetime.
pub struct NavigationPolicy {
    allowed_origin: Origin,
}

impl NavigationPolicy {
    pub fn for_app_url(app_url: &Url) -> Self {
        Self {
            allowed_origin: app_url.origin(),
        }
    }

    pub fn decide(&self, target: &Url) -> NavigationDecision {
        // Opaque origins (mailto:, about:, ...) never compare equal, so they
        // fall out of the window along with every foreign http(s) origin.
        if target.origin() == self.allowed_origin {
            NavigationDecision::Allow
        } else {
            NavigationDecision::OpenExternal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> NavigationPolicy {
        NavigationPolicy::for_app_url(&Url::parse("https://portal.acme.example/login").unwrap())
    }

    fn decide(target: &str) -> NavigationDecision {
        policy().decide(&Url::parse(target).unwrap())
    }

    #[test]
    fn same_origin_navigation_is_allowed() {
        assert_eq!(
            decide("https://portal.acme.example/catalog?view=all"),
            NavigationDecision::Allow
        );
    }

    #[test]
    fn foreign_host_leaves_the_window() {
        assert_eq!(
            decide("https://evil.example/portal.acme.example"),
            NavigationDecision::OpenExternal
        );
    }

    #[test]
    fn subdomain_is_a_foreign_origin() {
        assert_eq!(
            decide("https://docs.portal.acme.example/"),
            NavigationDecision::OpenExternal
        );
    }

    #[test]
    fn scheme_downgrade_leaves_the_window() {
        assert_eq!(
            decide("http://portal.acme.example/catalog"),
            NavigationDecision::OpenExternal
        );
    }

    #[test]
    fn explicit_port_change_leaves_the_window() {
        assert_eq!(
            decide("https://portal.acme.example:8443/"),
            NavigationDecision::OpenExternal
        );
    }

    #[test]
    fn opaque_origins_leave_the_window() {
        assert_eq!(
            decide("mailto:oncall@acme.example"),
            NavigationDecision::OpenExternal
        );
    }
}
