//! Builds the log-in URL that sends the user back to where they were.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Only local paths are followed, and never back to the log-in page itself.
fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map_or(redirect_url, |(path, _)| path);

    path != endpoints::LOG_IN_VIEW && path != endpoints::LOG_IN_API
}

fn local_path_and_query(uri: &Uri) -> Option<String> {
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// Reduce `raw_url` to a local path and query, rejecting absolute URLs.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    local_path_and_query(&uri)
}

/// The log-in URL with `redirect_target` in its query string.
pub fn build_log_in_redirect_url_from_target(redirect_target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => Some(format!("{}?{}", endpoints::LOG_IN_VIEW, param)),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}");
            None
        }
    }
}

/// The log-in URL that returns the user to the page behind `request`.
///
/// Page requests return to their own URL. htmx requests to `/api` return to
/// the page that sent them, taken from the `HX-Current-URL` header.
pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let redirect_target = if request.uri().path().starts_with("/api") {
        redirect_target_from_hx_request(request)?
    } else {
        local_path_and_query(request.uri())?
    };

    build_log_in_redirect_url_from_target(&redirect_target)
}

fn redirect_target_from_hx_request(request: &Request) -> Option<String> {
    let headers = request.headers();
    let is_hx_request = headers
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"));

    if !is_hx_request {
        tracing::warn!("Missing HX-Request header for /api request.");
        return None;
    }

    let Some(current_url) = headers
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())
    else {
        tracing::warn!("Missing HX-Current-URL header for /api request.");
        return None;
    };

    // The header holds an absolute URL, only its path and query are kept.
    let redirect_url = current_url
        .parse::<Uri>()
        .ok()
        .and_then(|uri| local_path_and_query(&uri));
    if redirect_url.is_none() {
        tracing::warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    redirect_url
}

#[cfg(test)]
mod redirect_tests {
    use axum::{body::Body, extract::Request};

    use crate::endpoints;

    use super::{build_log_in_redirect_url, normalize_redirect_url};

    #[test]
    fn keeps_local_path_and_query() {
        assert_eq!(
            normalize_redirect_url("/transactions?page=2&sort=amount"),
            Some("/transactions?page=2&sort=amount".to_owned())
        );
    }

    #[test]
    fn rejects_external_and_log_in_urls() {
        for url in [
            "https://example.com/dashboard",
            "//example.com/dashboard",
            "dashboard",
            endpoints::LOG_IN_VIEW,
            "/log_in?redirect_url=%2Fbudgets",
        ] {
            assert_eq!(normalize_redirect_url(url), None, "{url} should be rejected");
        }
    }

    #[test]
    fn page_request_redirects_back_to_itself() {
        let request = Request::get("/budgets?x=1").body(Body::empty()).unwrap();

        let got = build_log_in_redirect_url(&request);

        assert_eq!(got, Some("/log_in?redirect_url=%2Fbudgets%3Fx%3D1".to_owned()));
    }

    #[test]
    fn api_request_redirects_to_current_page() {
        let request = Request::delete("/api/transactions/1")
            .header("HX-Request", "true")
            .header("HX-Current-URL", "http://localhost:3000/transactions?page=3")
            .body(Body::empty())
            .unwrap();

        let got = build_log_in_redirect_url(&request);

        assert_eq!(
            got,
            Some("/log_in?redirect_url=%2Ftransactions%3Fpage%3D3".to_owned())
        );
    }

    #[test]
    fn api_request_without_htmx_headers_has_no_target() {
        let request = Request::delete("/api/transactions/1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(build_log_in_redirect_url(&request), None);
    }
}
