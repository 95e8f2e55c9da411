use std::fmt;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::Instrument;

pub const TRID_HEADER: &str = "x-trid";

/// Per-request transaction id: `YYYYMMDDHHMMSSmmm` followed by five random
/// digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrId(String);

impl TrId {
    pub fn generate() -> Self {
        Self::at(Utc::now(), rand::rng().random_range(0..100_000))
    }

    fn at(now: DateTime<Utc>, suffix: u32) -> Self {
        Self(format!("{}{:05}", now.format("%Y%m%d%H%M%S%3f"), suffix % 100_000))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Assigns a [`TrId`], exposes it to handlers as an extension, runs the rest
/// of the stack inside a span carrying it, and echoes it in `x-trid`.
pub async fn assign_trid(mut req: Request, next: Next) -> Response {
    let trid = TrId::generate();
    req.extensions_mut().insert(trid.clone());

    let span = tracing::info_span!(
        "request",
        trid = %trid,
        method = %req.method(),
        path = %req.uri().path()
    );
    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(trid.as_str()) {
        response.headers_mut().insert(TRID_HEADER, value);
    }
    response
}
