//! Request and route classification.
//!
//! Pure predicates, no I/O: the API client asks whether an outbound request
//! must carry an access token, and the frontend asks whether a navigation
//! target requires a live session.

/// Endpoints that never require an access token.
///
/// Matching is by substring containment on the normalized path, not exact
/// segment equality, so any path containing one of these fragments is
/// treated as public.
const PUBLIC_ENDPOINTS: &[&str] = &[
    "/auth/login",
    "/auth/register",
    "/auth/refresh-token",
    "/auth/forgot-password",
];

/// Route prefixes that require a valid session.
const PROTECTED_PREFIXES: &[&str] = &["/operation", "/credit", "/profile"];

/// Sign-in route, targeted when a protected route is opened without a session
pub const SIGN_IN_ROUTE: &str = "/sign-in";

/// Route shown when the session can no longer be refreshed
pub const SESSION_EXPIRED_ROUTE: &str = "/session-expired";

/// Strip scheme, authority, query and fragment, leaving only the path.
fn normalize_path(raw: &str) -> &str {
    let path = match raw.find("://") {
        Some(idx) => {
            let rest = &raw[idx + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "/",
            }
        }
        None => raw,
    };
    let end = path
        .find(|c| c == '?' || c == '#')
        .unwrap_or(path.len());
    &path[..end]
}

/// Whether an outbound request to `path` must carry an access token.
pub fn requires_authentication(path: &str) -> bool {
    let path = normalize_path(path);
    !PUBLIC_ENDPOINTS
        .iter()
        .any(|endpoint| path.contains(endpoint))
}

/// Whether a navigation target requires a live session. The root path is
/// protected exactly; everything else matches by prefix.
pub fn is_protected_route(pathname: &str) -> bool {
    pathname == "/"
        || PROTECTED_PREFIXES
            .iter()
            .any(|prefix| pathname.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_endpoints_need_no_token() {
        assert!(!requires_authentication("/auth/login"));
        assert!(!requires_authentication("/auth/register"));
        assert!(!requires_authentication("/auth/refresh-token"));
        assert!(!requires_authentication("/auth/forgot-password"));
    }

    #[test]
    fn data_endpoints_need_a_token() {
        assert!(requires_authentication("/account/balance"));
        assert!(requires_authentication("/operation"));
        assert!(requires_authentication("/user/profile"));
    }

    #[test]
    fn scheme_query_and_fragment_are_ignored() {
        assert!(!requires_authentication(
            "https://api.example.com/auth/login?redirect=/operation"
        ));
        assert!(requires_authentication(
            "https://api.example.com/operation?page=2#top"
        ));
        assert!(!requires_authentication("/auth/login#form"));
    }

    // Containment matching deliberately over-matches: a path that merely
    // contains a public fragment is classified public. These pin the current
    // behavior so changing it is a conscious decision.
    #[test]
    fn containment_classifies_embedded_fragments_as_public() {
        assert!(!requires_authentication("/user/auth/login-history"));
        assert!(!requires_authentication("/admin/auth/register-audit"));
    }

    #[test]
    fn query_parameter_mentions_do_not_count() {
        // The fragment appears only in the query, which is stripped first.
        assert!(requires_authentication("/operation?from=/auth/login"));
    }

    #[test]
    fn protected_routes_match_by_prefix() {
        assert!(is_protected_route("/"));
        assert!(is_protected_route("/operation"));
        assert!(is_protected_route("/operation/new"));
        assert!(is_protected_route("/credit"));
        assert!(is_protected_route("/profile"));
    }

    #[test]
    fn public_routes_are_not_protected() {
        assert!(!is_protected_route("/sign-in"));
        assert!(!is_protected_route("/sign-up"));
        assert!(!is_protected_route("/session-expired"));
        assert!(!is_protected_route("/about"));
    }
}
