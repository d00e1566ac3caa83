//! Prometheus metrics for newsletter-service.
//!
//! Exposes vote/comment/post collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

lazy_static! {
    /// Votes applied, by target (post/comment) and direction (up/down/ignored).
    pub static ref VOTES_APPLIED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "newsletter_votes_applied_total",
        "Votes applied segmented by target and direction",
        &["target", "direction"]
    )
    .expect("failed to register newsletter_votes_applied_total");

    /// Comments created, by parent kind (post/comment).
    pub static ref COMMENTS_CREATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "newsletter_comments_created_total",
        "Comments created segmented by parent kind",
        &["parent_kind"]
    )
    .expect("failed to register newsletter_comments_created_total");

    /// Replies rejected because the parent is already at the maximum depth.
    pub static ref COMMENT_DEPTH_REJECTIONS_TOTAL: IntCounter = register_int_counter!(
        "newsletter_comment_depth_rejections_total",
        "Replies rejected for exceeding the maximum comment depth"
    )
    .expect("failed to register newsletter_comment_depth_rejections_total");

    /// Comment deletions by mode (hard/soft/cascade).
    pub static ref COMMENT_DELETIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "newsletter_comment_deletions_total",
        "Comments removed or blanked segmented by deletion mode",
        &["mode"]
    )
    .expect("failed to register newsletter_comment_deletions_total");

    /// Posts deleted by their authors.
    pub static ref POSTS_DELETED_TOTAL: IntCounter = register_int_counter!(
        "newsletter_posts_deleted_total",
        "Posts deleted"
    )
    .expect("failed to register newsletter_posts_deleted_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
