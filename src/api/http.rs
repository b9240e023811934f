use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::domain::{ListPage, User, UserId, UserPayload};

use super::{ApiError, ErrorPayload, ListRequest, UserApi};

/// Characters escaped when an id is placed in a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// REST client for the user service rooted at `base_url`
/// (`GET/POST {base}/users`, `GET/PUT {base}/users/{id}`).
#[derive(Debug, Clone)]
pub struct HttpUserApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpUserApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(%base_url, "creating user service client");
        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    fn user_url(&self, id: &UserId) -> String {
        format!(
            "{}/users/{}",
            self.base_url,
            utf8_percent_encode(id.as_str(), PATH_SEGMENT)
        )
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|err| ApiError::Decode(err.to_string()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let payload = serde_json::from_str::<ErrorPayload>(&body).unwrap_or_else(|_| {
            let reason = status
                .canonical_reason()
                .unwrap_or("error")
                .to_ascii_lowercase()
                .replace(' ', "_");
            ErrorPayload::new(reason)
        });
        debug!(status = status.as_u16(), code = %payload.error, "request rejected");
        Err(ApiError::rejected(status.as_u16(), payload))
    }
}

#[async_trait]
impl UserApi for HttpUserApi {
    async fn list(&self, request: &ListRequest) -> Result<ListPage, ApiError> {
        self.execute(self.client.get(self.users_url()).query(request))
            .await
    }

    async fn get(&self, id: &UserId) -> Result<User, ApiError> {
        self.execute(self.client.get(self.user_url(id))).await
    }

    async fn create(&self, payload: &UserPayload) -> Result<User, ApiError> {
        self.execute(self.client.post(self.users_url()).json(payload))
            .await
    }

    async fn update(&self, id: &UserId, payload: &UserPayload) -> Result<User, ApiError> {
        self.execute(self.client.put(self.user_url(id)).json(payload))
            .await
    }
}
