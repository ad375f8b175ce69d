//! Requester for calls between services in the mesh
//!
//! Every failure, whether local or reported by the downstream service,
//! comes back as a typed [`ErrorInstance`].

#![allow(clippy::must_use_candidate)]

mod error;

use std::time::Duration;

use emf_config::Config;
use emf_errors::{
    BuiltinCode, DataValue, ErrorData, ErrorHandler, ErrorInstance, RESPONSE_DATA_KEY, cause, decode_failure_response,
    error_data,
};
use indexmap::IndexMap;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

pub use error::ClientError;

/// Query parameter forwarded to downstream services in debug mode
const DEBUG_QUERY_PARAM: &str = "debug_mode";

/// HTTP client addressing other services by component name
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    http: reqwest::Client,
    domains: IndexMap<String, Url>,
    headers: HeaderMap,
}

impl DownstreamClient {
    /// Create a client with default transport settings
    pub fn new(domains: IndexMap<String, Url>) -> Self {
        Self {
            http: reqwest::Client::new(),
            domains,
            headers: HeaderMap::new(),
        }
    }

    /// Create a client from the `[domains]` and `[client]` sections
    ///
    /// # Errors
    ///
    /// Returns an error if a configured header is invalid or the HTTP client
    /// cannot be built
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.client.timeout_seconds))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;

        let mut client = Self {
            http,
            domains: config.domains.clone(),
            headers: HeaderMap::new(),
        };

        for (name, value) in &config.client.headers {
            client = client.with_header(name, value)?;
        }

        Ok(client)
    }

    /// Add a header sent with every request
    ///
    /// # Errors
    ///
    /// Returns an error if the name or value is not a valid header
    pub fn with_header(mut self, name: &str, value: &str) -> anyhow::Result<Self> {
        let name = HeaderName::try_from(name).map_err(|e| anyhow::anyhow!("invalid header name '{name}': {e}"))?;
        let value =
            HeaderValue::try_from(value).map_err(|e| anyhow::anyhow!("invalid value for header '{name}': {e}"))?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Base URL configured for a component
    pub fn domain(&self, component: &str) -> Option<&Url> {
        self.domains.get(component)
    }

    /// `GET` a JSON resource
    ///
    /// # Errors
    ///
    /// See [`Self::request`]
    pub async fn get<O>(&self, handler: &ErrorHandler, component: &str, path: &str) -> Result<O, ErrorInstance>
    where
        O: DeserializeOwned,
    {
        self.request::<(), O>(handler, Method::GET, component, path, None).await
    }

    /// `POST` a JSON body
    ///
    /// # Errors
    ///
    /// See [`Self::request`]
    pub async fn post<I, O>(
        &self,
        handler: &ErrorHandler,
        component: &str,
        path: &str,
        input: &I,
    ) -> Result<O, ErrorInstance>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.request(handler, Method::POST, component, path, Some(input)).await
    }

    /// Call `path` on the service owning `component`
    ///
    /// In debug mode `debug_mode=true` is forwarded so the downstream
    /// service answers with full error details too. An empty success body
    /// decodes as JSON `null`.
    ///
    /// # Errors
    ///
    /// Returns the downstream service's own error when it answers with a
    /// status of 400 or above, or one of the `http.500.Requester*` builtins
    /// when the request cannot be built, sent, or decoded
    pub async fn request<I, O>(
        &self,
        handler: &ErrorHandler,
        method: Method,
        component: &str,
        path: &str,
        input: Option<&I>,
    ) -> Result<O, ErrorInstance>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let url = self.build_url(handler, component, path)?;

        let body = input
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| handler.builtin(BuiltinCode::RequesterEncodingFailure, ErrorData::new(), [cause(e)]))?;

        let mut builder = self.http.request(method.clone(), url).headers(self.headers.clone());
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let request = builder
            .build()
            .map_err(|e| handler.builtin(BuiltinCode::RequesterCreateRequestFailure, ErrorData::new(), [cause(e)]))?;

        tracing::debug!(%method, url = %request.url(), component, "sending downstream request");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| handler.builtin(BuiltinCode::RequesterSendRequestFailure, ErrorData::new(), [cause(e)]))?;

        let status = response.status();

        if status.as_u16() >= 400 {
            let instance = match response.bytes().await {
                Ok(body) => decode_failure_response(handler, &body),
                Err(e) => handler.builtin(
                    BuiltinCode::RequesterErrorResponseFailure,
                    error_data! { RESPONSE_DATA_KEY => DataValue::Null },
                    [cause(e)],
                ),
            };

            tracing::warn!(
                component,
                status = status.as_u16(),
                error_code = instance.error_code(),
                "downstream request failed"
            );

            return Err(instance);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| handler.builtin(BuiltinCode::RequesterDecodingFailure, ErrorData::new(), [cause(e)]))?;
        let body: &[u8] = if body.is_empty() { b"null" } else { &body };

        serde_json::from_slice(body)
            .map_err(|e| handler.builtin(BuiltinCode::RequesterDecodingFailure, ErrorData::new(), [cause(e)]))
    }

    fn build_url(&self, handler: &ErrorHandler, component: &str, path: &str) -> Result<Url, ErrorInstance> {
        let create_failure = |error: ClientError| {
            handler.builtin(BuiltinCode::RequesterCreateRequestFailure, ErrorData::new(), [cause(error)])
        };

        let domain = self.domains.get(component).ok_or_else(|| {
            create_failure(ClientError::UnknownComponent {
                component: component.to_owned(),
            })
        })?;

        let raw = format!("{}/{}", domain.as_str().trim_end_matches('/'), path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|source| {
            create_failure(ClientError::InvalidUrl {
                url: raw.clone(),
                source,
            })
        })?;

        if handler.is_debug() {
            url.query_pairs_mut().append_pair(DEBUG_QUERY_PARAM, "true");
        }

        Ok(url)
    }
}
