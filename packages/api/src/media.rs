//! Hosted image upload.
//!
//! [`Cloudinary`] posts the picked file to the account's unsigned upload
//! endpoint as `multipart/form-data` (`file` plus `upload_preset`) and returns
//! the `secure_url` of the stored image.

use reqwest::multipart;
use serde::Deserialize;

use store::config::MediaConfig;
use store::{ImageFile, MediaHost, UploadError};

use crate::rest::{self, RestError};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    secure_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Cloudinary {
    http: reqwest::Client,
    upload_url: String,
    upload_preset: String,
}

impl Cloudinary {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: config.upload_url(),
            upload_preset: config.upload_preset.clone(),
        }
    }

    fn build_form(&self, image: &ImageFile) -> Result<multipart::Form, UploadError> {
        let part = multipart::Part::bytes(image.bytes.clone())
            .file_name(image.name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| UploadError::Rejected(format!("bad content type: {e}")))?;
        Ok(multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone()))
    }
}

fn upload_error(err: RestError) -> UploadError {
    match err {
        RestError::Status { message, .. } => UploadError::Rejected(message),
        RestError::Transport(e) => UploadError::Transport(e.to_string()),
        RestError::Decode(msg) => UploadError::Transport(msg),
    }
}

fn secure_url(response: UploadResponse) -> Result<String, UploadError> {
    response
        .secure_url
        .filter(|url| !url.is_empty())
        .ok_or(UploadError::MissingUrl)
}

impl MediaHost for Cloudinary {
    async fn upload(&self, image: &ImageFile) -> Result<String, UploadError> {
        if image.is_empty() {
            return Err(UploadError::Rejected("empty file".to_string()));
        }
        let form = self.build_form(image)?;
        let response: UploadResponse =
            rest::send_json(self.http.post(&self.upload_url).multipart(form))
                .await
                .map_err(upload_error)?;
        let url = secure_url(response)?;
        tracing::debug!(name = %image.name, bytes = image.len(), %url, "image stored");
        Ok(url)
    }
}
