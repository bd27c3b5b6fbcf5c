//! Static CORS headers attached to every response.

use http::HeaderMap;
use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue,
};

/// Methods advertised by the request router.
pub const ROUTER_ALLOW_METHODS: &str = "GET,OPTIONS,PATCH,DELETE,POST,PUT";

/// Methods advertised by the migration endpoint.
pub const MIGRATION_ALLOW_METHODS: &str = "GET,OPTIONS";

pub const ALLOW_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, \
Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

/// Insert the four CORS headers, replacing any existing values.
pub fn apply(headers: &mut HeaderMap, allow_methods: &'static str) {
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(allow_methods),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}
