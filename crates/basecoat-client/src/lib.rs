// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use basecoat_app::{FormulaCatalog, FormulaId};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const LISTING_PATH: &str = "formulas";
const DETAIL_PATH: &str = "formula";
const MAX_ERROR_BODY_CHARS: usize = 120;

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: HttpClient,
}

/// Checks that `raw` is an http(s) URL the endpoints can be appended to.
pub fn validate_base_url(raw: &str) -> Result<()> {
    parse_base_url(raw).map(|_| ())
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("server.base_url must not be empty");
    }

    let url = Url::parse(trimmed).with_context(|| format!("parse server URL {trimmed:?}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!(
            "server URL {trimmed:?} must use http or https, got {}",
            url.scheme()
        );
    }
    if url.cannot_be_a_base() {
        bail!("server URL {trimmed:?} cannot carry a path");
    }
    Ok(url)
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn listing_url(&self) -> Result<Url> {
        self.endpoint(&[LISTING_PATH])
    }

    /// `GET {base}/formula/{identifier}`, with the identifier encoded as a
    /// single path segment.
    pub fn detail_url(&self, identifier: &FormulaId) -> Result<Url> {
        self.endpoint(&[DETAIL_PATH, identifier.as_str()])
    }

    pub fn list_formulas(&self) -> Result<FormulaCatalog> {
        let url = self.listing_url()?;
        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let catalog: FormulaCatalog = response
            .json()
            .with_context(|| format!("decode formula listing from {url}"))?;
        tracing::info!(rows = catalog.rows.len(), "formula listing loaded");
        Ok(catalog)
    }

    pub fn fetch_formula_detail(&self, identifier: &FormulaId) -> Result<String> {
        let url = self.detail_url(identifier)?;
        tracing::debug!(%url, "fetching formula detail");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        response
            .text()
            .with_context(|| format!("read detail body for formula {identifier}"))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("server URL {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("request to {base_url} timed out -- raise [server].timeout or check the server");
    }
    anyhow!(
        "cannot reach {} -- is the formula server running? ({})",
        base_url,
        error
    )
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
    message: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.error.or(parsed.message)
        && !message.trim().is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message.trim());
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && !trimmed.contains('<') && !trimmed.contains('{') {
        let snippet = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>();
        return anyhow!("server error ({}): {}", status.as_u16(), snippet);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::{Client, clean_error_response, validate_base_url};
    use anyhow::Result;
    use basecoat_app::FormulaId;
    use reqwest::StatusCode;
    use std::time::Duration;

    fn client(base: &str) -> Result<Client> {
        Client::new(base, Duration::from_secs(1))
    }

    #[test]
    fn detail_url_places_identifier_in_one_path_segment() -> Result<()> {
        let client = client("http://localhost:8080")?;
        let id = FormulaId::parse("42").expect("valid id");
        assert_eq!(
            client.detail_url(&id)?.as_str(),
            "http://localhost:8080/formula/42"
        );

        let tricky = FormulaId::parse("a/b c?d").expect("valid id");
        assert_eq!(
            client.detail_url(&tricky)?.as_str(),
            "http://localhost:8080/formula/a%2Fb%20c%3Fd"
        );
        Ok(())
    }

    #[test]
    fn endpoints_keep_a_base_path_prefix() -> Result<()> {
        let client = client("https://paint.example/app///")?;
        assert_eq!(client.base_url(), "https://paint.example/app");
        assert_eq!(
            client.listing_url()?.as_str(),
            "https://paint.example/app/formulas"
        );
        Ok(())
    }

    #[test]
    fn rejects_empty_and_non_http_urls() {
        let empty = client("  ").expect_err("empty url should fail");
        assert!(empty.to_string().contains("must not be empty"));

        let ftp = client("ftp://files.example").expect_err("ftp should fail");
        assert!(ftp.to_string().contains("http or https"));

        let garbage = client("not a url").expect_err("garbage should fail");
        assert!(garbage.to_string().contains("parse server URL"));

        assert!(validate_base_url("http://127.0.0.1:8080/").is_ok());
        assert!(validate_base_url("mailto:paint@example.com").is_err());
    }

    #[test]
    fn error_responses_prefer_json_message_then_short_text() {
        let json = clean_error_response(StatusCode::NOT_FOUND, r#"{"error":"no such formula"}"#);
        assert_eq!(json.to_string(), "server error (404): no such formula");

        let text = clean_error_response(StatusCode::BAD_GATEWAY, "  upstream down \n");
        assert_eq!(text.to_string(), "server error (502): upstream down");

        let html = clean_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html><body>boom</body></html>",
        );
        assert_eq!(html.to_string(), "server returned 500");
    }
}
