//! Hatena Fotolife AtomAPI client

use super::atom;
use crate::auth::Credentials;
use crate::config::HATENA_FOTOLIFE_URL;
use crate::error::{errors, HatenaResult, PublishPhase};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

/// Image hosting operations used by image sync.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload raw image bytes, returning the hosted image URL.
    async fn upload_image(
        &self,
        credentials: &Credentials,
        title: &str,
        image: &[u8],
    ) -> HatenaResult<String>;

    async fn delete_image(&self, credentials: &Credentials, image_id: &str) -> HatenaResult<()>;
}

pub struct FotolifeClient {
    client: Client,
    base_url: String,
}

impl Default for FotolifeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FotolifeClient {
    pub fn new() -> Self {
        Self::with_base_url(HATENA_FOTOLIFE_URL, None)
    }

    pub fn with_base_url(base_url: impl Into<String>, client: Option<Client>) -> Self {
        Self {
            client: client.unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    pub fn post_url(&self) -> String {
        format!("{}/atom/post", self.base_url.trim_end_matches('/'))
    }

    pub fn edit_url(&self, image_id: &str) -> String {
        format!(
            "{}/atom/edit/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(image_id)
        )
    }
}

#[async_trait]
impl ImageHost for FotolifeClient {
    async fn upload_image(
        &self,
        credentials: &Credentials,
        title: &str,
        image: &[u8],
    ) -> HatenaResult<String> {
        let url = self.post_url();
        let body = atom::image_entry_xml(title, &STANDARD.encode(image));
        let header = credentials
            .signer()
            .authorization_header("POST", &url, &[])?;
        debug!("POST {} ({} bytes)", url, image.len());

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, header)
            .header(CONTENT_TYPE, "application/xml")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if status != StatusCode::CREATED {
            return Err(errors::publish_error(
                PublishPhase::UploadingImages,
                text.trim().chars().take(200).collect::<String>(),
                Some(status.as_u16()),
            ));
        }

        let image_url = atom::element_text(&text, "hatena:imageurl")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                errors::publish_error(
                    PublishPhase::UploadingImages,
                    "Response has no hatena:imageurl",
                    Some(status.as_u16()),
                )
            })?;
        info!("Uploaded image to {}", image_url);
        Ok(image_url)
    }

    async fn delete_image(&self, credentials: &Credentials, image_id: &str) -> HatenaResult<()> {
        let url = self.edit_url(image_id);
        let header = credentials
            .signer()
            .authorization_header("DELETE", &url, &[])?;
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .header(AUTHORIZATION, header)
            .send()
            .await?;
        let status = response.status();

        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(errors::publish_error(
                PublishPhase::DeletingImages,
                text.trim().chars().take(200).collect::<String>(),
                Some(status.as_u16()),
            ));
        }
        info!("Deleted image {}", image_id);
        Ok(())
    }
}
