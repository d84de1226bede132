use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::config::Settings;
use crate::schemas::exam::ExamDefinition;
use crate::schemas::group::ExamGroup;
use crate::schemas::result::{ExamResult, RemarkPayload, SubmitResultPayload};

/// Backend surface the flow controllers talk through. Kept as a trait so
/// tests and embedders can substitute their own transport.
#[async_trait]
pub trait ExamApi: Send + Sync {
    async fn fetch_exam(&self, exam_id: i64) -> Result<ExamDefinition>;
    async fn fetch_exam_group(&self, group_id: i64) -> Result<ExamGroup>;
    async fn list_group_exams(&self, group_id: i64) -> Result<Vec<ExamDefinition>>;
    async fn list_results(&self, student_id: i64, group_id: i64) -> Result<Vec<ExamResult>>;
    async fn submit_result(&self, payload: &SubmitResultPayload) -> Result<ExamResult>;
    async fn update_result(&self, result_id: i64, payload: &RemarkPayload) -> Result<ExamResult>;
    async fn create_exam(&self, payload: &serde_json::Value) -> Result<serde_json::Value>;
}

pub struct HttpExamApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpExamApi {
    pub fn from_settings(settings: &Settings, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(settings.api().request_timeout_secs))
            .build()
            .context("failed to build http client")?;
        Ok(HttpExamApi { client, base_url: settings.api().base_url.clone(), token })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .authorize(self.client.get(self.url(path)))
            .send()
            .await
            .with_context(|| format!("GET {path} failed"))?;
        Self::parse(path, response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .authorize(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {path} failed"))?;
        Self::parse(path, response).await
    }

    async fn put_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .authorize(self.client.put(self.url(path)))
            .json(body)
            .send()
            .await
            .with_context(|| format!("PUT {path} failed"))?;
        Self::parse(path, response).await
    }

    async fn parse<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("request to {path} returned {status}: {body}");
        }
        response
            .json()
            .await
            .with_context(|| format!("invalid response body from {path}"))
    }
}

#[async_trait]
impl ExamApi for HttpExamApi {
    async fn fetch_exam(&self, exam_id: i64) -> Result<ExamDefinition> {
        self.get_json(&format!("/exam/{exam_id}")).await
    }

    async fn fetch_exam_group(&self, group_id: i64) -> Result<ExamGroup> {
        self.get_json(&format!("/exam_group/{group_id}")).await
    }

    async fn list_group_exams(&self, group_id: i64) -> Result<Vec<ExamDefinition>> {
        self.get_json(&format!("/exam/?exam_group={group_id}")).await
    }

    async fn list_results(&self, student_id: i64, group_id: i64) -> Result<Vec<ExamResult>> {
        self.get_json(&format!("/exam_result/?student={student_id}&exam_group={group_id}"))
            .await
    }

    async fn submit_result(&self, payload: &SubmitResultPayload) -> Result<ExamResult> {
        self.post_json("/exam_result", payload).await
    }

    async fn update_result(&self, result_id: i64, payload: &RemarkPayload) -> Result<ExamResult> {
        self.put_json(&format!("/exam_result/{result_id}"), payload).await
    }

    async fn create_exam(&self, payload: &serde_json::Value) -> Result<serde_json::Value> {
        self.post_json("/exam", payload).await
    }
}
