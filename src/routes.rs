use crate::{
    api::{attendance, reply::{Reply, ReplyStatus}},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, error::InternalError, web};
use std::sync::Arc;
use tracing::warn;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-scope limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            (60_000 / requests_per_min as u64).max(1)
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min.max(1))
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("period and burst size are non-zero");
        Governor::new(&cfg)
    }

    let kiosk_limiter = Arc::new(build_limiter(config.rate_kiosk_per_min));
    let admin_limiter = Arc::new(build_limiter(config.rate_admin_per_min));

    // Malformed kiosk bodies get the same envelope as other rejections
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        warn!(error = %err, "Rejected kiosk payload");
        let body = Reply::new(ReplyStatus::Warning, "The information sent is not valid");
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    });

    cfg.service(
        web::scope(&config.api_prefix)
            // /attendance/record (kiosk)
            .service(
                web::resource("/attendance/record")
                    .app_data(json_config)
                    .wrap(kiosk_limiter)
                    .route(web::post().to(attendance::record_attendance)),
            )
            .service(
                web::scope("/attendance")
                    .wrap(admin_limiter)
                    // /attendance
                    .service(web::resource("").route(web::get().to(attendance::list_records)))
                    // /attendance/daily
                    .service(
                        web::resource("/daily").route(web::get().to(attendance::daily_records)),
                    )
                    // /attendance/sites/{site_id}/count
                    .service(
                        web::resource("/sites/{site_id}/count")
                            .route(web::get().to(attendance::site_record_count)),
                    ),
            ),
    );
}
