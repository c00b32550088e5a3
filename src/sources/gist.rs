use crate::error::{Error, Result};
use crate::http::HttpClient;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

#[derive(Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: Map<String, Value>,
}

#[derive(Deserialize)]
struct GistFile {
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    raw_url: Option<String>,
}

/// Fetches a GitHub gist and parses its first file as JSON.
///
/// Large files come back truncated from the API; their full text is then
/// read from `raw_url`.
pub async fn fetch(
    http: &HttpClient,
    api_url: &str,
    gist_id: &str,
    token: Option<&str>,
) -> Result<Value> {
    let url = format!("{}/gists/{}", api_url.trim_end_matches('/'), gist_id.trim());
    let bearer = token.map(|t| format!("Bearer {t}"));
    let mut headers = vec![("Accept", "application/vnd.github+json")];
    if let Some(bearer) = &bearer {
        headers.push(("Authorization", bearer.as_str()));
    }

    let gist: GistResponse = http.get_json(&url, &headers).await?;
    let Some((filename, file)) = gist.files.into_iter().next() else {
        return Err(Error::api("github", format!("gist {gist_id} has no files")));
    };
    let file: GistFile = serde_json::from_value(file)
        .map_err(|e| Error::parse(format!("gist file {filename}: {e}")))?;

    let content = match (file.truncated, file.raw_url, file.content) {
        (true, Some(raw_url), _) => {
            debug!(file = %filename, "gist file truncated, fetching raw content");
            http.get_text(&raw_url, &[]).await?
        }
        (_, _, Some(content)) => content,
        (_, _, None) => {
            return Err(Error::api("github", format!("gist file {filename} has no content")));
        }
    };

    let value: Value = serde_json::from_str(&content)
        .map_err(|e| Error::parse(format!("gist file {filename}: {e}")))?;
    info!(gist = gist_id, file = %filename, "gist loaded");
    Ok(value)
}
