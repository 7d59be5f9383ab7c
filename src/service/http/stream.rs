//! 状态 SSE 流 (`GET /status/stream`)
//!
//! 每 15s 推送一个带 RFC-3339 时间戳的 ping 事件,
//! 客户端断开即终止

use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures::StreamExt;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;

const PING_INTERVAL: Duration = Duration::from_secs(15);

pub async fn status_stream() -> HttpResponse {
    let start = tokio::time::Instant::now() + PING_INTERVAL;
    let stream = IntervalStream::new(tokio::time::interval_at(start, PING_INTERVAL)).map(|_| {
        let payload = serde_json::json!({ "ts": Utc::now().to_rfc3339() });
        Ok::<_, std::convert::Infallible>(web::Bytes::from(format!(
            "event: ping\ndata: {}\n\n",
            payload
        )))
    });

    HttpResponse::Ok()
        .insert_header(("Content-Type", "text/event-stream"))
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(stream)
}
