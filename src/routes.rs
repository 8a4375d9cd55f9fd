use crate::{api::leave_request, auth::middleware::auth_middleware, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Helper to build per-scope limiter
fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

/// Leave routes, relative to the API prefix.
pub fn leave_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leave")
            // /leave
            .service(web::resource("").route(web::post().to(leave_request::create_leave)))
            // /leave/day-count
            .service(web::resource("/day-count").route(web::post().to(leave_request::day_count)))
            // /leave/summary
            .service(
                web::resource("/summary").route(web::post().to(leave_request::leave_summary)),
            )
            // /leave/{id}
            .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
            // /leave/{id}/approve
            .service(
                web::resource("/{id}/approve").route(web::put().to(leave_request::approve_leave)),
            )
            // /leave/{id}/reject
            .service(
                web::resource("/{id}/reject").route(web::put().to(leave_request::reject_leave)),
            )
            // /leave/{id}/cancel
            .service(
                web::resource("/{id}/cancel").route(web::put().to(leave_request::cancel_leave)),
            ),
    );
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let scope = web::scope(&config.api_prefix)
        .wrap(from_fn(auth_middleware)) // authentication
        .configure(leave_routes);

    // rate limiting wraps outside authentication
    match build_limiter(config.rate_protected_per_min) {
        Some(limiter) => cfg.service(scope.wrap(limiter)),
        None => {
            tracing::warn!("Invalid rate limit settings, serving without a limiter");
            cfg.service(scope)
        }
    };
}
