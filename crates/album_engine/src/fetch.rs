use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER, USER_AGENT};

use crate::{EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, FetchSettings};

const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
}

/// One upstream request. Every request carries the album page as referer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: RequestMethod,
    pub url: String,
    pub referer: String,
    pub form: Vec<(String, String)>,
}

impl FetchRequest {
    /// Image download.
    pub fn get(url: impl Into<String>, referer: impl Into<String>) -> Self {
        Self {
            method: RequestMethod::Get,
            url: url.into(),
            referer: referer.into(),
            form: Vec::new(),
        }
    }

    /// Listing request posted as an XHR form.
    pub fn post_form(
        url: impl Into<String>,
        referer: impl Into<String>,
        form: &[(&str, String)],
    ) -> Self {
        Self {
            method: RequestMethod::Post,
            url: url.into(),
            referer: referer.into(),
            form: form
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
        }
    }

    fn encoded_form(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.form.iter())
            .finish()
    }
}

/// A single attempt at one request. Retrying lives in `fetch_with_retry`.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutput, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn build(&self, request: &FetchRequest, url: reqwest::Url) -> reqwest::RequestBuilder {
        let builder = match request.method {
            RequestMethod::Get => self
                .client
                .get(url)
                .header(ACCEPT, IMAGE_ACCEPT)
                .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5"),
            RequestMethod::Post => self
                .client
                .post(url)
                .header("X-Requested-With", "XMLHttpRequest")
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(request.encoded_form()),
        };
        builder
            .header(USER_AGENT, self.settings.user_agent.as_str())
            .header(REFERER, request.referer.as_str())
    }

    fn too_large(&self, actual: u64) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            "response too large",
        )
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutput, FetchError> {
        let parsed = reqwest::Url::parse(&request.url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let response = self
            .build(request, parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(content_len));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let metadata = FetchMetadata {
            original_url: request.url.clone(),
            final_url,
            content_type,
            byte_len: bytes.len() as u64,
        };

        Ok(FetchOutput {
            bytes: bytes.freeze(),
            metadata,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
