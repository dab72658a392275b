// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Retrieval of a single TSL document by URI.

use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use tracing::debug;
use trustl_tsl::{xml, Source, StatusList};
use url::Url;

use crate::error::Error;
use crate::options::FetchOptions;

const MAX_REDIRECTS: usize = 10;

/// Fetches TSL documents from `file://` and HTTP(S) origins.
///
/// One fetcher is built per pipeline run from that run's [`FetchOptions`];
/// the HTTP client carries the options' user agent, timeout and a redirect
/// cap of 10 hops. The fetcher parses what it retrieves and stamps the
/// origin URI as the document source. It never follows TSL references.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: reqwest::Client,
    accept: String,
}

impl Fetcher {
    /// Builds a fetcher from the given options.
    pub fn new(options: &FetchOptions) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(options.user_agent())
            .timeout(options.timeout())
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| Error::Network {
                uri: String::new(),
                reason: format!("building http client: {e}"),
            })?;
        Ok(Self {
            client,
            accept: options.accept().to_string(),
        })
    }

    /// Retrieves and parses the TSL at `uri`.
    pub async fn fetch(&self, uri: &Url) -> Result<StatusList, Error> {
        debug!(uri = %uri, "fetching TSL");
        match uri.scheme() {
            "file" => self.fetch_file(uri).await,
            "http" | "https" => self.fetch_http(uri).await,
            other => Err(Error::Scheme {
                uri: uri.to_string(),
                scheme: other.to_string(),
            }),
        }
    }

    async fn fetch_file(&self, uri: &Url) -> Result<StatusList, Error> {
        let path = uri.to_file_path().map_err(|()| Error::Io {
            uri: uri.to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "file URI has no local path",
            ),
        })?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| Error::Io {
            uri: uri.to_string(),
            source: e,
        })?;
        xml::decode_bytes(&bytes, Source::from(uri)).map_err(|e| Error::Parse {
            uri: uri.to_string(),
            source: e,
        })
    }

    async fn fetch_http(&self, uri: &Url) -> Result<StatusList, Error> {
        let response = self
            .client
            .get(uri.clone())
            .header(ACCEPT, &self.accept)
            .send()
            .await
            .map_err(|e| Error::Network {
                uri: uri.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network {
                uri: uri.to_string(),
                reason: format!("unexpected status {status}"),
            });
        }

        let body = response.bytes().await.map_err(|e| Error::Network {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        xml::decode_bytes(&body, Source::from(uri)).map_err(|e| Error::Parse {
            uri: uri.to_string(),
            source: e,
        })
    }
}
