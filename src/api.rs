use crate::error::{ApiError, SupplyError};
use crate::leaderboard::{ScoreSink, ScoreSubmission, Standings};
use crate::words::{GenerateRequest, WordSource};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderValue, COOKIE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const GENERATE_WORDS: &str = "/api/generate-words";
const LEADERBOARD: &str = "/api/leaderboard";
const PROFILE: &str = "/api/profile";

#[derive(Debug, Deserialize)]
struct GeneratedWords {
    words: Vec<String>,
}

/// Authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub username: String,
}

/// Source of the username that labels submitted scores
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn username(&self) -> Result<String, ApiError>;
}

/// Client for the typing server's JSON endpoints
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    http: Client,
    token: Option<HeaderValue>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|e| ApiError::Url(format!("{base_url}: {e}")))?;
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base,
            http,
            token: None,
        })
    }

    /// Session cookie sent with every request.
    pub fn with_token(mut self, token: &str) -> Result<Self, ApiError> {
        let value = HeaderValue::from_str(&format!("token={token}"))
            .map_err(|e| ApiError::Url(format!("invalid token: {e}")))?;
        self.token = Some(value);
        Ok(self)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| ApiError::Url(format!("{path}: {e}")))?;
        let builder = self.http.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.header(COOKIE, token.clone()),
            None => builder,
        })
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(ApiError::RateLimited),
            status if !status.is_success() => Err(ApiError::Status(status.as_u16())),
            _ => Ok(response),
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn generate_words(&self, request: &GenerateRequest) -> Result<Vec<String>, ApiError> {
        let builder = self.request(Method::POST, GENERATE_WORDS)?.json(request);
        let generated: GeneratedWords = Self::decode(Self::send(builder).await?).await?;
        debug!("server generated {} words", generated.words.len());
        Ok(generated.words)
    }

    pub async fn submit_score(&self, score: &ScoreSubmission) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, LEADERBOARD)?.json(score);
        Self::send(builder).await?;
        Ok(())
    }

    pub async fn fetch_leaderboard(&self) -> Result<Standings, ApiError> {
        let builder = self.request(Method::GET, LEADERBOARD)?;
        Self::decode(Self::send(builder).await?).await
    }

    pub async fn fetch_profile(&self) -> Result<Profile, ApiError> {
        let builder = self.request(Method::GET, PROFILE)?;
        Self::decode(Self::send(builder).await?).await
    }
}

#[async_trait]
impl WordSource for ApiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<String>, SupplyError> {
        Ok(self.generate_words(request).await?)
    }
}

#[async_trait]
impl ScoreSink for ApiClient {
    async fn submit(&self, score: &ScoreSubmission) -> Result<(), ApiError> {
        self.submit_score(score).await
    }
}

#[async_trait]
impl ProfileSource for ApiClient {
    async fn username(&self) -> Result<String, ApiError> {
        Ok(self.fetch_profile().await?.username)
    }
}
