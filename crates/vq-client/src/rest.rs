//! [`VocabularySource`] over the content repository's JSON endpoints.
//!
//! | Lookup     | Request                                                      |
//! |------------|--------------------------------------------------------------|
//! | suggest    | `GET {vocabulary_base}{acronym}.search.json?suggest=…&customFilter=…` |
//! | term info  | `GET {term_path}.info.json`                                  |
//! | vocabulary | `GET {vocabulary_path}.json`                                 |
//!
//! Every request is bounded by the configured timeout and never retried.

use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use http_body_util::{BodyExt, Empty};
use hyper::header::ACCEPT;
use hyper::Request;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use url::Url;

use vq_core::config::ServerConfig;
use vq_core::{
    LookupError, SuggestQuery, Suggestion, Term, VocabularyDocument, VocabularySource,
};

use crate::wire::{InfoResponse, SearchResponse, VocabularyResponse};
use crate::ClientError;

pub struct RestSource {
    client: Client<HttpConnector, Empty<Bytes>>,
    base: Url,
    vocabulary_base: String,
    timeout: Duration,
}

impl RestSource {
    /// Build a source rooted at `base_url`. Only plain `http` is supported.
    pub fn new(
        base_url: &str,
        vocabulary_base: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base.scheme() != "http" {
            return Err(ClientError::UnsupportedScheme(base.scheme().to_string()));
        }
        let client = Client::builder(TokioExecutor::new()).build_http();
        Ok(Self {
            client,
            base,
            vocabulary_base: format!("/{}/", vocabulary_base.trim_matches('/')),
            timeout,
        })
    }

    pub fn from_config(server: &ServerConfig) -> Result<Self, ClientError> {
        Self::new(&server.base_url, &server.vocabulary_base, server.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn join(&self, path: &str) -> Result<Url, LookupError> {
        self.base
            .join(path)
            .map_err(|e| LookupError::InvalidUrl(format!("{path}: {e}")))
    }

    pub(crate) fn search_url(&self, query: &SuggestQuery) -> Result<Url, LookupError> {
        let mut url = self.join(&format!(
            "{}{}.search.json",
            self.vocabulary_base, query.vocabulary
        ))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("suggest", &query.text);
            if let Some(filter) = &query.filter {
                pairs.append_pair("customFilter", filter);
            }
        }
        Ok(url)
    }

    pub(crate) fn info_url(&self, term_path: &str) -> Result<Url, LookupError> {
        self.join(&format!("{term_path}.info.json"))
    }

    pub(crate) fn vocabulary_url(&self, vocab_path: &str) -> Result<Url, LookupError> {
        self.join(&format!("{vocab_path}.json"))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, LookupError> {
        let request = Request::get(url.as_str())
            .header(ACCEPT, "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| LookupError::InvalidUrl(e.to_string()))?;

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| LookupError::Transport(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(LookupError::Status(status.as_u16()));
            }
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| LookupError::Transport(e.to_string()))?
                .to_bytes();
            serde_json::from_slice(&body).map_err(|e| LookupError::Decode(e.to_string()))
        };

        tracing::debug!(%url, "rest: GET");
        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => {
                if let Err(err) = &result {
                    tracing::debug!(%url, error = %err, "rest: request failed");
                }
                result
            }
            Err(_) => Err(LookupError::Timeout(self.timeout)),
        }
    }
}

impl VocabularySource for RestSource {
    fn suggest<'a>(
        &'a self,
        query: &'a SuggestQuery,
    ) -> BoxFuture<'a, Result<Vec<Suggestion>, LookupError>> {
        async move {
            let url = self.search_url(query)?;
            let response: SearchResponse = self.get_json(url).await?;
            Ok(response
                .rows
                .into_iter()
                .map(|row| row.into_suggestion(&query.vocabulary))
                .collect())
        }
        .boxed()
    }

    fn term_info<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Term, LookupError>> {
        async move {
            let url = self.info_url(path)?;
            let response: InfoResponse = self.get_json(url).await?;
            Ok(response.into_term())
        }
        .boxed()
    }

    fn vocabulary<'a>(
        &'a self,
        path: &'a str,
    ) -> BoxFuture<'a, Result<VocabularyDocument, LookupError>> {
        async move {
            let url = self.vocabulary_url(path)?;
            let response: VocabularyResponse = self.get_json(url).await?;
            Ok(response.into_document())
        }
        .boxed()
    }
}
