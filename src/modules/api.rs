use std::sync::Arc;
use std::time::Duration;
use log::{debug, info};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;
use crate::modules::error::EditError;
use crate::modules::types::UploadResponse;

pub const CSRF_HEADER: &str = "X-CSRFToken";

fn default_user_agent() -> String {
    "cms-edit/0.1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Where the site lives and how to authenticate against it.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SiteConfig {
    pub base_url: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub csrf_token: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SiteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session_id: None,
            csrf_token: None,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ElementRecord {
    #[serde(default)]
    json_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Deserialize)]
struct ToggleResponse {
    edit_mode: bool,
}

/// The CMS content endpoints the editor talks to.
#[allow(async_fn_in_trait)]
pub trait ContentApi {
    /// Returns the record's stored `json_content`, empty when it has none.
    async fn fetch_document(&self, element_id: &str) -> Result<String, EditError>;
    /// Replaces one field of a record; `Ok(false)` means the server refused.
    async fn update_field(&self, element_id: &str, field: &str, value: &str) -> Result<bool, EditError>;
    async fn upload_image(
        &self,
        element_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, EditError>;
    async fn toggle_edit_mode(&self) -> Result<bool, EditError>;
}

pub struct HttpContentApi {
    base: Url,
    client: Client,
    csrf_token: Option<String>,
}

impl HttpContentApi {
    pub fn new(config: &SiteConfig) -> Result<Self, EditError> {
        let mut base = Url::parse(config.base_url.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let jar = Arc::new(Jar::default());
        if let Some(session) = &config.session_id {
            jar.add_cookie_str(&format!("sessionid={session}"), &base);
        }
        if let Some(csrf) = &config.csrf_token {
            jar.add_cookie_str(&format!("csrftoken={csrf}"), &base);
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);
        headers.insert(REFERER, HeaderValue::from_str(base.as_str())?);

        let client = Client::builder()
            .cookie_provider(jar)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base,
            client,
            csrf_token: config.csrf_token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, EditError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    fn element_endpoint(&self, element_id: &str, action: &str) -> Result<Url, EditError> {
        self.endpoint(&format!("dashboard/element/{element_id}/{action}/"))
    }

    /// Downloads a rendered page so its editable regions can be scanned.
    pub async fn fetch_page(&self, path: &str) -> Result<String, EditError> {
        let url = self.endpoint(path)?;
        debug!("GET {url}");
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(html)
    }
}

impl ContentApi for HttpContentApi {
    async fn fetch_document(&self, element_id: &str) -> Result<String, EditError> {
        let url = self.element_endpoint(element_id, "get")?;
        debug!("GET {url}");
        let record: ElementRecord = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(record.json_content.unwrap_or_default())
    }

    async fn update_field(&self, element_id: &str, field: &str, value: &str) -> Result<bool, EditError> {
        let url = self.element_endpoint(element_id, "update")?;
        debug!("POST {url} field={field}");
        let answer: UpdateResponse = self
            .client
            .post(url)
            .form(&[("field", field), ("value", value)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(answer.success)
    }

    async fn upload_image(
        &self,
        element_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, EditError> {
        let url = self.element_endpoint(element_id, "upload-image")?;
        debug!("POST {url} image={file_name} ({} bytes)", bytes.len());
        let form = Form::new().part("image", Part::bytes(bytes).file_name(file_name.to_string()));
        let answer: UploadResponse = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(answer)
    }

    async fn toggle_edit_mode(&self) -> Result<bool, EditError> {
        let url = self.endpoint("dashboard/toggle-edit-mode/")?;
        let mut request = self.client.post(url);
        if let Some(csrf) = &self.csrf_token {
            request = request.header(CSRF_HEADER, csrf);
        }
        let answer: ToggleResponse = request.send().await?.error_for_status()?.json().await?;
        info!("Edit mode is now {}", if answer.edit_mode { "on" } else { "off" });
        Ok(answer.edit_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_hang_off_the_base_path() {
        let api = HttpContentApi::new(&SiteConfig::new("http://localhost:8000/cms")).unwrap();
        assert_eq!(
            api.element_endpoint("12", "update").unwrap().as_str(),
            "http://localhost:8000/cms/dashboard/element/12/update/"
        );
        assert_eq!(
            api.endpoint("/page/contact/").unwrap().as_str(),
            "http://localhost:8000/cms/page/contact/"
        );
    }

    #[test]
    fn config_defaults_fill_in() {
        let config: SiteConfig = toml::from_str(r#"base_url = "http://example.test""#).unwrap();
        assert_eq!(config.user_agent, "cms-edit/0.1");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.session_id.is_none());
    }

    #[test]
    fn bad_base_url_is_rejected() {
        assert!(matches!(HttpContentApi::new(&SiteConfig::new("not a url")), Err(EditError::Url(_))));
    }
}
