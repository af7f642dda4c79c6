//! `DevServer` backed by a running HTTP dev server

use super::DevServer;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::time::Duration;

const CLIENT_TAG: &str = r#"<script type="module" src="/@vite/client"></script>"#;

/// Talks to a dev server over HTTP.
///
/// Uses a blocking client; construct and call it outside of an async runtime, or from
/// `spawn_blocking`.
pub struct HttpDevServer {
    origin: String,
    client: Client,
}

impl HttpDevServer {
    pub fn new(origin: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            origin: origin.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn fetch(&self, url: &str) -> Result<String> {
        self.client
            .get(url)
            .send()
            .with_context(|| format!("failed to request {url}"))?
            .error_for_status()
            .with_context(|| format!("dev server returned an error for {url}"))?
            .text()
            .with_context(|| format!("failed to read response for {url}"))
    }
}

impl DevServer for HttpDevServer {
    fn origin(&self) -> &str {
        &self.origin
    }

    fn transform_index_html(&self, _file: &str, html: &str) -> Result<String> {
        Ok(inject_client_tag(html))
    }

    fn load_style(&self, file: &str) -> Result<String> {
        self.fetch(&format!("{}?direct", self.url_for(file)))
    }
}

/// Add the live-reload client script to a page that does not load it yet
fn inject_client_tag(html: &str) -> String {
    if html.contains("/@vite/client") {
        return html.to_string();
    }
    match html.find("</head>") {
        Some(index) => format!("{}{}{}", &html[..index], CLIENT_TAG, &html[index..]),
        None => format!("{}{}", CLIENT_TAG, html),
    }
}
