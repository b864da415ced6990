//! API route definitions.

mod admin;
mod count;
mod csp;
mod health;
mod log;
mod registration;

use axum::Router;
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::response::Response;
use axum::routing::get;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::state::AppState;

/// Build the complete API router.
///
/// # Route Structure
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Beacons (CORS: mirrored origin, credentials allowed)
/// - `POST /api/log` - JSON body beacon
/// - `GET /api/log` - Authenticated log retrieval (Bearer secret)
/// - `GET /api/log-csp` - Query-parameter beacon
///
/// ## Aggregates (cacheable for 600 seconds)
/// - `GET /api/count` - Capped total time on page
/// - `GET /api/count/visitors` - Distinct hashed visitors
/// - `GET /api/count/projects` - Registered projects
/// - `GET /api/count/builds` - Distinct payload hashes
///
/// ## Registration / admin
/// - `GET /api/registration` - Issue a project id / secret key pair
/// - `GET /api/admin/logs` - Logs for one project
/// - `GET /api/admin/projects` - Project listing with sample URLs
pub fn router(state: AppState) -> Router {
    let public = Router::new().route("/health", get(health::health_check));

    // Each beacon group carries its own CORS layer so the OPTIONS preflight
    // declares exactly the methods that group supports.
    let log_routes = Router::new()
        .route("/log", get(log::list).post(log::submit))
        .layer(cors_layer([Method::GET, Method::POST]));

    let csp_routes = Router::new()
        .route("/log-csp", get(csp::submit))
        .layer(axum::middleware::map_response(add_no_store_headers))
        .layer(cors_layer([Method::GET]));

    let count_routes = Router::new()
        .route("/count", get(count::total_time))
        .route("/count/visitors", get(count::visitors))
        .route("/count/projects", get(count::projects))
        .route("/count/builds", get(count::builds))
        .layer(axum::middleware::map_response(add_cache_headers));

    let misc_routes = Router::new()
        .route("/registration", get(registration::register))
        .route("/admin/logs", get(admin::logs))
        .route("/admin/projects", get(admin::projects));

    Router::new()
        .merge(public)
        .nest(
            "/api",
            log_routes
                .merge(csp_routes)
                .merge(count_routes)
                .merge(misc_routes),
        )
        .with_state(state)
}

/// CORS for beacon routes: widgets run on arbitrary origins and submit with
/// credentials, so the request `Origin` is echoed back rather than `*`.
fn cors_layer<const N: usize>(methods: [Method; N]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Add cache headers to aggregate responses.
///
/// Clients and CDNs may serve count queries for 600 seconds; the same TTL
/// the server-side cache uses.
async fn add_cache_headers(response: Response) -> Response {
    if response.status().is_success() {
        let (mut parts, body) = response.into_parts();
        parts.headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=600"),
        );
        Response::from_parts(parts, body)
    } else {
        response
    }
}

/// Beacon responses must never be served from a cache.
async fn add_no_store_headers(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate"),
    );
    response
}

/// Visitor IP as reported by the edge: `cf-connecting-ip` first, then the
/// first entry of `x-forwarded-for`.
pub(crate) fn visitor_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(ip) = headers
        .get("cf-connecting-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some(ip.to_string());
    }

    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visitor_ip_prefers_cf_header() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", "203.0.113.7".parse().unwrap());
        headers.insert("x-forwarded-for", "198.51.100.1".parse().unwrap());
        assert_eq!(visitor_ip(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn visitor_ip_falls_back_to_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "198.51.100.1, 10.0.0.1".parse().unwrap(),
        );
        assert_eq!(visitor_ip(&headers).as_deref(), Some("198.51.100.1"));
    }

    #[test]
    fn visitor_ip_absent() {
        assert_eq!(visitor_ip(&HeaderMap::new()), None);
    }
}
