//! The API endpoints URIs.

/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/auth/logout";
/// The route for getting the logged in user.
pub const CURRENT_USER: &str = "/api/auth/me";
/// The route for the revenue and expense totals with the monthly breakdown.
pub const DASHBOARD_SUMMARY: &str = "/api/dashboard/summary";
/// The route for the monthly breakdown bucketed by month, quarter or year.
pub const DASHBOARD_CHART: &str = "/api/dashboard/chart";
/// The route for filtering, sorting and paging transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for listing the users that have transactions.
pub const TRANSACTION_USERS: &str = "/api/transactions/users";
/// The route for counting the transactions an export would contain.
pub const EXPORT_PREVIEW: &str = "/api/transactions/export/preview";
/// The route for exporting transactions as CSV.
pub const EXPORT: &str = "/api/transactions/export";

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::REGISTER);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::CURRENT_USER);
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD_SUMMARY);
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD_CHART);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION_USERS);
        assert_endpoint_is_valid_uri(endpoints::EXPORT_PREVIEW);
        assert_endpoint_is_valid_uri(endpoints::EXPORT);
    }

    #[test]
    fn api_routes_share_prefix() {
        for endpoint in [
            endpoints::REGISTER,
            endpoints::LOG_IN,
            endpoints::LOG_OUT,
            endpoints::CURRENT_USER,
            endpoints::DASHBOARD_SUMMARY,
            endpoints::DASHBOARD_CHART,
            endpoints::TRANSACTIONS,
            endpoints::TRANSACTION_USERS,
            endpoints::EXPORT_PREVIEW,
            endpoints::EXPORT,
        ] {
            assert!(endpoint.starts_with("/api/"), "{endpoint}");
        }
    }
}
