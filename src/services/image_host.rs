use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;

use crate::configuration::ImgurSettings;

/// Hosts an image and hands back its public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload_image(&self, image: Vec<u8>) -> anyhow::Result<String>;
}

pub struct ImgurClient {
    client: Client,
    client_id: String,
    upload_url: String,
}

#[derive(Deserialize)]
struct ImgurResponse {
    success: bool,
    data: ImgurData,
}

#[derive(Deserialize)]
struct ImgurData {
    link: Option<String>,
    error: Option<serde_json::Value>,
}

impl ImgurClient {
    pub fn new(settings: ImgurSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(ImgurClient {
            client,
            client_id: settings.client_id,
            upload_url: settings.upload_url,
        })
    }
}

#[async_trait]
impl ImageHost for ImgurClient {
    async fn upload_image(&self, image: Vec<u8>) -> anyhow::Result<String> {
        let part = multipart::Part::bytes(image).file_name("screenshot.png");
        let form = multipart::Form::new()
            .part("image", part)
            .text("type", "file");

        let res = self
            .client
            .post(&self.upload_url)
            .header("Authorization", format!("Client-ID {}", self.client_id))
            .multipart(form)
            .send()
            .await
            .context("No response from imgur")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            bail!("Imgur upload failed with status {}: {}", status, body);
        }

        let json = res
            .json::<ImgurResponse>()
            .await
            .context("Error when deserializing imgur response")?;

        if !json.success {
            bail!("Imgur reported failure: {:?}", json.data.error);
        }

        json.data
            .link
            .ok_or_else(|| anyhow!("Imgur response has no link"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::{ImageHost, ImgurClient};
    use crate::configuration::ImgurSettings;

    fn client(server: &MockServer) -> ImgurClient {
        ImgurClient::new(ImgurSettings {
            client_id: "abc123".to_string(),
            upload_url: format!("{}/3/upload", server.uri()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn upload_returns_link_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/3/upload"))
            .and(header("Authorization", "Client-ID abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": "xyz", "link": "https://i.imgur.com/xyz.png" },
                "success": true,
                "status": 200
            })))
            .expect(1)
            .mount(&server)
            .await;

        let link = client(&server).upload_image(vec![1, 2, 3]).await.unwrap();

        assert_eq!(link, "https://i.imgur.com/xyz.png");
    }

    #[tokio::test]
    async fn upload_fails_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/3/upload"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "data": { "error": "Too Many Requests" },
                "success": false,
                "status": 429
            })))
            .mount(&server)
            .await;

        let result = client(&server).upload_image(vec![1, 2, 3]).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn upload_fails_when_success_flag_is_false() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/3/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "error": "Invalid image" },
                "success": false,
                "status": 400
            })))
            .mount(&server)
            .await;

        let result = client(&server).upload_image(vec![0]).await;

        assert!(result.is_err());
    }
}
