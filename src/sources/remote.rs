use crate::error::{Error, Result};
use crate::http::HttpClient;
use serde_json::Value;
use tracing::info;

pub fn is_http_url(s: &str) -> bool {
    let s = s.trim();
    s.starts_with("http://") || s.starts_with("https://")
}

/// Fetches a KPI document from a plain URL. The body must be a JSON array or
/// object.
pub async fn fetch(http: &HttpClient, url: &str) -> Result<Value> {
    if !is_http_url(url) {
        return Err(Error::parse(format!("not an http(s) url: {url}")));
    }
    let value: Value = http.get_json(url.trim(), &[("Accept", "application/json")]).await?;
    if !(value.is_array() || value.is_object()) {
        return Err(Error::parse(format!("{url}: expected a JSON array or object")));
    }
    info!(url, "remote data loaded");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn recognises_http_urls() {
        assert!(is_http_url(" https://x.example/a.json"));
        assert!(is_http_url("http://localhost:8080"));
        assert!(!is_http_url("[{\"name\":\"S\"}]"));
        assert!(!is_http_url("ftp://x"));
    }

    #[tokio::test]
    async fn fetches_array_and_rejects_scalars() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/kpi.json")
            .with_status(200)
            .with_body(r#"[{"name": "Default"}]"#)
            .create_async()
            .await;
        let _scalar = server
            .mock("GET", "/scalar.json")
            .with_status(200)
            .with_body("3")
            .create_async()
            .await;

        let http = HttpClient::new("growlitics-test", Duration::from_secs(5)).unwrap();
        let value = fetch(&http, &format!("{}/kpi.json", server.url())).await.unwrap();
        assert_eq!(value, json!([{"name": "Default"}]));

        let err = fetch(&http, &format!("{}/scalar.json", server.url())).await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
