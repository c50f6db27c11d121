use axum::{
    http::header::{CACHE_CONTROL, CONTENT_TYPE, EXPIRES, PRAGMA},
    response::IntoResponse,
};

use crate::codec::Codec;
use crate::mock_data;

// ─── GET /tasks/protobuf ─────────────────────────────────────────

pub async fn get_tasks_protobuf() -> impl IntoResponse {
    encoded(Codec::CompactBinary)
}

// ─── GET /tasks/json ─────────────────────────────────────────────

pub async fn get_tasks_json() -> impl IntoResponse {
    encoded(Codec::StructuredText)
}

// ─── Helpers ─────────────────────────────────────────────────────

/// Encodes the cached dataset on every request, so serialization cost is
/// part of what the client measures. The `cb` query is ignored.
fn encoded(codec: Codec) -> impl IntoResponse {
    let body = codec.encode(mock_data::dataset());
    (
        [
            (CONTENT_TYPE, codec.content_type()),
            (CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (PRAGMA, "no-cache"),
            (EXPIRES, "0"),
        ],
        body,
    )
}
