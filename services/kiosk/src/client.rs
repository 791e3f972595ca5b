//! HTTP client for the attendance API

use std::time::Duration;

use attendance::models::Organization;
use attendance::{CheckInRequest, CheckInResponse, EndSessionResponse};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Client errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    /// Could not reach the service
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    /// The service answered with an error body
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("Parse error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Calls the kiosk makes against its session
pub trait CheckInApi: Clone + Send + Sync + 'static {
    fn check_in(
        &self,
        external_code: &str,
    ) -> impl Future<Output = Result<CheckInResponse, ClientError>> + Send;

    /// Whether the check-in endpoint is reachable
    fn probe(&self) -> impl Future<Output = bool> + Send;

    fn end_session(&self) -> impl Future<Output = Result<EndSessionResponse, ClientError>> + Send;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    organization_id: Uuid,
    session_id: Uuid,
}

impl HttpClient {
    pub fn new(
        base_url: &str,
        organization_id: Uuid,
        session_id: Uuid,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            organization_id,
            session_id,
        })
    }

    fn check_in_url(&self) -> String {
        format!("{}/sessions/{}/check-in", self.base_url, self.session_id)
    }

    /// Expected code length configured on the organization
    pub async fn fetch_code_length(&self) -> Result<Option<usize>, ClientError> {
        let url = format!("{}/organizations/{}", self.base_url, self.organization_id);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }

        let organization: Organization = response.json().await?;
        Ok(organization
            .code_length
            .and_then(|len| usize::try_from(len).ok()))
    }
}

async fn server_error(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };
    ClientError::Server {
        status: status.as_u16(),
        message,
    }
}

impl CheckInApi for HttpClient {
    async fn check_in(&self, external_code: &str) -> Result<CheckInResponse, ClientError> {
        let request = CheckInRequest {
            external_code: external_code.to_string(),
            organization_id: self.organization_id,
        };

        let response = self
            .http
            .post(self.check_in_url())
            .json(&request)
            .send()
            .await?;

        // These statuses carry a check-in answer rather than an error body
        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NOT_FOUND | StatusCode::CONFLICT => {
                let reply: CheckInResponse = response.json().await?;
                debug!("Check-in of {} answered {:?}", external_code, reply.status);
                Ok(reply)
            }
            _ => Err(server_error(response).await),
        }
    }

    async fn probe(&self) -> bool {
        match self.http.head(self.check_in_url()).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Reachability probe failed: {}", e);
                false
            }
        }
    }

    async fn end_session(&self) -> Result<EndSessionResponse, ClientError> {
        let url = format!(
            "{}/organizations/{}/sessions/{}/end",
            self.base_url, self.organization_id, self.session_id
        );
        let response = self.http.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        Ok(response.json().await?)
    }
}
