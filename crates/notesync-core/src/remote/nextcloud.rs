//! Nextcloud Notes API (v0.2) client.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{in_category, NotePayload, RemoteError, RemoteNote, RemoteNotes, RemoteResult};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const NOTES_API_PATH: &str = "index.php/apps/notes/api/v0.2/notes";
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Server location and basic-auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    /// Host name (`cloud.example.com`) or base URL (`https://example.com/nc`)
    pub host: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for RemoteCredentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RemoteCredentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone)]
pub struct NextcloudClient {
    endpoint: String,
    username: String,
    password: String,
    client: reqwest::Client,
}

impl NextcloudClient {
    pub fn new(credentials: RemoteCredentials) -> RemoteResult<Self> {
        let endpoint = normalize_endpoint(credentials.host)?;
        let username = normalize_text_option(Some(credentials.username)).ok_or_else(|| {
            RemoteError::InvalidConfiguration("username must not be empty".to_string())
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|error| RemoteError::InvalidConfiguration(error.to_string()))?;

        Ok(Self {
            endpoint,
            username,
            password: credentials.password,
            client,
        })
    }

    /// Notes collection URL all requests are made against.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn note_url(&self, id: &str) -> String {
        format!("{}/{id}", self.endpoint)
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Request(parse_api_error(status, &body)))
    }
}

impl RemoteNotes for NextcloudClient {
    async fn list_notes(&self, category: Option<&str>) -> RemoteResult<Vec<RemoteNote>> {
        tracing::debug!("REQUEST: GET {}?exclude=content", self.endpoint);
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("exclude", "content")]);
        let response = self.send(request).await?;
        let mut notes = read_json::<Vec<RemoteNote>>(response).await?;

        // The API has no server-side category filter.
        notes.retain(|note| in_category(note, category));
        Ok(notes)
    }

    async fn get_note(&self, id: &str) -> RemoteResult<RemoteNote> {
        let url = self.note_url(id);
        tracing::debug!("REQUEST: GET {url}");
        let response = self.send(self.client.get(&url)).await?;
        read_json(response).await
    }

    async fn update_note(&self, payload: &NotePayload) -> RemoteResult<RemoteNote> {
        let request = match &payload.id {
            Some(id) => {
                let url = self.note_url(id);
                tracing::debug!("REQUEST: PUT {url}");
                self.client.put(url)
            }
            None => {
                tracing::debug!("REQUEST: POST {}", self.endpoint);
                self.client.post(&self.endpoint)
            }
        };
        let response = self.send(request.json(payload)).await?;
        read_json(response).await
    }

    async fn delete_note(&self, id: &str) -> RemoteResult<()> {
        let url = self.note_url(id);
        tracing::debug!("REQUEST: DELETE {url}");
        let result = self
            .client
            .delete(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = result.status();
        // Already gone on the server counts as a confirmed delete.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = result.text().await.unwrap_or_default();
        Err(RemoteError::Request(parse_api_error(status, &body)))
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
    let body = response.text().await.map_err(map_transport_error)?;
    serde_json::from_str(&body).map_err(|error| {
        RemoteError::MalformedResponse(format!("{error}: {}", compact_text(&body)))
    })
}

fn map_transport_error(error: reqwest::Error) -> RemoteError {
    if error.is_connect() || error.is_timeout() {
        RemoteError::Connection(error.to_string())
    } else if error.is_decode() || error.is_body() {
        RemoteError::MalformedResponse(error.to_string())
    } else {
        RemoteError::Request(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_endpoint(host: String) -> RemoteResult<String> {
    let host = normalize_text_option(Some(host)).ok_or_else(|| {
        RemoteError::InvalidConfiguration("host must not be empty".to_string())
    })?;
    let base = if is_http_url(&host) {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    };
    Ok(format!("{base}/{NOTES_API_PATH}"))
}
