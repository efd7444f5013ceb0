//! Turning an APASS HTTP response into a CSV body or a [`CatalogError`].

use crate::error::CatalogError;

/// Used when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
/// Error pages are HTML; only the start is worth keeping in a message.
const MAX_ERROR_BODY: usize = 200;

/// Body of a successful CSV download.
///
/// # Errors
///
/// `RateLimited` on 429, `Api` on any other non-success status, and `Parse`
/// when a 200 response is an HTML page rather than CSV (APASS answers bad
/// queries that way).
pub async fn csv_body(resp: reqwest::Response) -> Result<String, CatalogError> {
    let status = resp.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(CatalogError::RateLimited {
            retry_after_secs: retry_after(&resp),
        });
    }

    let body = resp.text().await?;
    if !status.is_success() {
        return Err(CatalogError::Api {
            status: status.as_u16(),
            message: excerpt(&body),
        });
    }
    if body.trim_start().starts_with('<') {
        return Err(CatalogError::Parse(format!(
            "expected CSV, got markup: {}",
            excerpt(&body)
        )));
    }
    Ok(body)
}

fn retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Whitespace-collapsed prefix of `body`.
fn excerpt(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &collapsed[..cut]),
        None => collapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response(status: u16, retry_after: Option<&str>, body: &str) -> reqwest::Response {
        let mut builder = ::http::Response::builder().status(status);
        if let Some(value) = retry_after {
            builder = builder.header("Retry-After", value);
        }
        reqwest::Response::from(builder.body(body.to_string()).unwrap())
    }

    #[tokio::test]
    async fn csv_passes_through() {
        let body = csv_body(response(200, None, "radeg,decdeg\n1,2\n")).await.unwrap();
        assert_eq!(body, "radeg,decdeg\n1,2\n");
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after() {
        let err = csv_body(response(429, Some("120"), "")).await.unwrap_err();
        assert!(matches!(err, CatalogError::RateLimited { retry_after_secs: 120 }));

        let err = csv_body(response(429, Some("soon"), "")).await.unwrap_err();
        assert!(matches!(err, CatalogError::RateLimited { retry_after_secs: 60 }));
    }

    #[tokio::test]
    async fn server_error_keeps_a_short_body() {
        let page = format!("<html>\n  <body>{}</body></html>", "x".repeat(500));
        let err = csv_body(response(503, None, &page)).await.unwrap_err();
        let (status, message) = match err {
            CatalogError::Api { status, message } => (status, message),
            other => panic!("expected api error, got {other}"),
        };
        assert_eq!(status, 503);
        assert!(message.starts_with("<html> <body>xxx"));
        assert!(message.ends_with("..."));
        assert_eq!(message.chars().count(), MAX_ERROR_BODY + 3);
    }

    #[tokio::test]
    async fn html_with_ok_status_is_a_parse_error() {
        let err = csv_body(response(200, None, "  <HTML>Invalid query</HTML>"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Parse(msg) if msg.contains("Invalid query")));
    }
}
