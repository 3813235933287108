// Transport layer: one blocking form POST per call. The `Transport` trait is
// the seam the API client is written against, so tests can swap the real
// HTTP stack for a scripted one.

use std::fmt;

use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::error::ApiError;

/// Default API root of the platform.
pub const DEFAULT_BASE_URL: &str = "http://lgxt.wutp.com.cn/api";

/// Environment variable that overrides [`DEFAULT_BASE_URL`].
pub const BASE_URL_ENV: &str = "LGXT_API_URL";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The platform endpoints this client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Profile,
    Courses,
    Coursework,
    Submit,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Login => "/login",
            Endpoint::Profile => "/userInfo",
            Endpoint::Courses => "/myCourses",
            Endpoint::Coursework => "/myCourseWorks",
            Endpoint::Submit => "/submitAnswer",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Form fields of a request, in wire order.
pub type Form = Vec<(&'static str, String)>;

/// Sends a single POST and hands back the body of a 200 response.
pub trait Transport {
    /// `form: None` sends an empty body. `token` is attached verbatim as the
    /// `Authorization` header. Exactly one request is issued.
    fn post(
        &self,
        endpoint: Endpoint,
        form: Option<&Form>,
        token: Option<&str>,
    ) -> Result<Vec<u8>, ApiError>;
}

/// `reqwest` backed transport rooted at a base URL.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(HttpTransport { client, base_url })
    }

    /// Root taken from `LGXT_API_URL`, falling back to the public platform.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

impl Transport for HttpTransport {
    fn post(
        &self,
        endpoint: Endpoint,
        form: Option<&Form>,
        token: Option<&str>,
    ) -> Result<Vec<u8>, ApiError> {
        tracing::debug!(
            %endpoint,
            authorized = token.is_some(),
            fields = ?form.map(|f| f.iter().map(|(k, _)| *k).collect::<Vec<_>>()),
            "sending request"
        );

        let mut req = self
            .client
            .post(self.url(endpoint))
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE);
        req = match form {
            Some(fields) => req.form(fields),
            None => req.body(Vec::new()),
        };
        if let Some(token) = token {
            let value = HeaderValue::from_str(token)
                .map_err(|e| ApiError::transport(endpoint.path(), e))?;
            req = req.header(AUTHORIZATION, value);
        }

        // The response owns the connection; it is released when `res` drops,
        // on every path out of this function.
        let res = req
            .send()
            .map_err(|e| ApiError::transport(endpoint.path(), e))?;
        let status = res.status();
        if status != StatusCode::OK {
            let body = res.text().unwrap_or_default();
            tracing::warn!(%endpoint, status = status.as_u16(), "unexpected HTTP status");
            return Err(ApiError::HttpStatus {
                endpoint: endpoint.path().to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = res
            .bytes()
            .map_err(|e| ApiError::transport(endpoint.path(), e))?;
        Ok(body.to_vec())
    }
}
