// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocking HTTP calls, run on the tokio blocking pool

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("blocking task failed: {0}")]
    Join(String),
}

impl HttpError {
    /// Server errors and transport failures may succeed on retry
    pub fn is_transient(&self) -> bool {
        match self {
            HttpError::Status(code) => *code >= 500 || *code == 429,
            HttpError::Transport(_) | HttpError::Join(_) => true,
        }
    }
}

impl From<ureq::Error> for HttpError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(code) => HttpError::Status(code),
            other => HttpError::Transport(other.to_string()),
        }
    }
}

async fn blocking<F>(f: F) -> Result<String, HttpError>
where
    F: FnOnce() -> Result<String, HttpError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| HttpError::Join(e.to_string()))?
}

pub async fn get_text(url: String) -> Result<String, HttpError> {
    blocking(move || {
        let mut response = ureq::get(&url).call()?;
        Ok(response.body_mut().read_to_string()?)
    })
    .await
}

pub async fn post_json(url: String, body: String) -> Result<String, HttpError> {
    blocking(move || {
        let mut response = ureq::post(&url)
            .header("Content-Type", "application/json")
            .send(body.as_str())?;
        Ok(response.body_mut().read_to_string()?)
    })
    .await
}

pub async fn delete(url: String) -> Result<String, HttpError> {
    blocking(move || {
        let mut response = ureq::delete(&url).call()?;
        Ok(response.body_mut().read_to_string()?)
    })
    .await
}
