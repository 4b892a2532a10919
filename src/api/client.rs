//! reqwestによるバックエンドAPIクライアント
//!
//! 2xx以外のレスポンスはJSON本文の `detail` をメッセージとするエラーに正規化する。
//! トークンが設定されていれば全リクエストに `Authorization: Bearer` を付ける。

use super::types::{error_message, DeleteResponse, PromptResponse, ReportResponse, UploadResponse};
use super::{
    ReportBackend, DELETE_FAILED, DOWNLOAD_FAILED, LIST_FAILED, PROMPT_FAILED, REPORT_FAILED,
    UPLOAD_FAILED,
};
use crate::config::Config;
use crate::error::{MlsCompareError, Result};
use crate::scanner::LocalFile;
use mls_compare_common::ManualPropertyInput;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>, timeout_secs: u64, connect_timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()?;
        Ok(Self::with_http(http, base_url, token))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.base_url,
            config.token.clone(),
            config.timeout_seconds,
            config.connect_timeout_seconds,
        )
    }

    /// 構築済みの `reqwest::Client` を使う
    pub fn with_http(http: reqwest::Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// ベースURLにパスセグメントを足す（IDはセグメント単位でエスケープ）
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| MlsCompareError::Config(format!("invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| MlsCompareError::Config(format!("invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, fallback: &str) -> Result<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "backend response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(MlsCompareError::Api {
            status: status.as_u16(),
            message: error_message(&body, fallback),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, fallback: &str) -> Result<T> {
        let response = self.send(request, fallback).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// 比較物件IDのクエリ値（カンマ区切り）
    fn comparison_param(comparison_ids: &[String]) -> String {
        comparison_ids.join(",")
    }
}

fn pdf_part(file: &LocalFile) -> Result<Part> {
    Ok(Part::bytes(file.bytes.clone())
        .file_name(file.name.clone())
        .mime_str(&file.mime_type)?)
}

#[async_trait::async_trait]
impl ReportBackend for ApiClient {
    async fn upload_primary(&self, file: &LocalFile) -> Result<UploadResponse> {
        debug!(file = %file.name, size = file.size, "uploading MLS report");
        let form = Form::new().part("file", pdf_part(file)?);
        let request = self.http.post(self.endpoint(&["upload-input-pdf"])?).multipart(form);
        self.send_json(request, UPLOAD_FAILED).await
    }

    async fn upload_comparisons(&self, files: &[LocalFile]) -> Result<UploadResponse> {
        debug!(count = files.len(), "uploading comparison PDFs");
        let mut form = Form::new();
        for file in files {
            form = form.part("files", pdf_part(file)?);
        }
        let request = self.http.post(self.endpoint(&["upload-comparison-pdf"])?).multipart(form);
        self.send_json(request, UPLOAD_FAILED).await
    }

    async fn generate_prompt(&self, source_id: &str, comparison_ids: &[String]) -> Result<PromptResponse> {
        let comparisons = Self::comparison_param(comparison_ids);
        let request = self
            .http
            .get(self.endpoint(&["generate-report-chatgpt"])?)
            .query(&[("input_file", source_id), ("comparison_files", comparisons.as_str())]);
        self.send_json(request, PROMPT_FAILED).await
    }

    async fn generate_prompt_manual(
        &self,
        manual: &ManualPropertyInput,
        comparison_ids: &[String],
    ) -> Result<PromptResponse> {
        let comparisons = Self::comparison_param(comparison_ids);
        let request = self
            .http
            .post(self.endpoint(&["generate-chatgpt-prompt-manual"])?)
            .query(&[("comparison_files", comparisons.as_str())])
            .json(manual);
        self.send_json(request, PROMPT_FAILED).await
    }

    async fn generate_report(&self, source_id: &str, comparison_ids: &[String]) -> Result<ReportResponse> {
        let comparisons = Self::comparison_param(comparison_ids);
        let request = self
            .http
            .get(self.endpoint(&["generate-report"])?)
            .query(&[("input_file", source_id), ("comparison_files", comparisons.as_str())]);
        self.send_json(request, REPORT_FAILED).await
    }

    async fn generate_report_manual(
        &self,
        manual: &ManualPropertyInput,
        comparison_ids: &[String],
    ) -> Result<ReportResponse> {
        let comparisons = Self::comparison_param(comparison_ids);
        let request = self
            .http
            .post(self.endpoint(&["generate-report-manual"])?)
            .query(&[("comparison_files", comparisons.as_str())])
            .json(manual);
        self.send_json(request, REPORT_FAILED).await
    }

    async fn download_report(&self, report_id: &str) -> Result<Vec<u8>> {
        let request = self.http.get(self.endpoint(&["download-report", report_id])?);
        let response = self.send(request, DOWNLOAD_FAILED).await?;
        Ok(response.bytes().await?.to_vec())
    }

    fn view_url(&self, report_id: &str) -> String {
        let mut url = match self.endpoint(&["view-report", report_id]) {
            Ok(url) => url,
            Err(_) => return format!("{}/view-report/{}", self.base_url, report_id),
        };
        if let Some(token) = &self.token {
            url.query_pairs_mut().append_pair("token", token);
        }
        url.to_string()
    }

    async fn list_files(&self) -> Result<serde_json::Value> {
        let request = self.http.get(self.endpoint(&["files"])?);
        self.send_json(request, LIST_FAILED).await
    }

    async fn delete_file(&self, file_id: &str) -> Result<DeleteResponse> {
        let request = self.http.delete(self.endpoint(&["files", file_id])?);
        self.send_json(request, DELETE_FAILED).await
    }
}
