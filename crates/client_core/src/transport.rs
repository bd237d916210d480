//! HTTP plumbing for the chart service. Requests carry no timeout and are
//! never retried.

use anyhow::{anyhow, Context, Result};
use reqwest::{
    header::CONTENT_DISPOSITION,
    multipart::{Form, Part},
    Body, Client, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use shared::domain::SelectedFile;
use url::Url;

use crate::progress::{chunked_with_progress, UPLOAD_CHUNK_BYTES};

const DEFAULT_DOWNLOAD_NAME: &str = "report";

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub url: Url,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a server-provided location the way a browser would: absolute
    /// URLs are kept, rooted paths replace the base path.
    pub fn resolve(&self, location: &str) -> Result<Url> {
        self.base_url
            .join(location)
            .with_context(|| format!("invalid location '{location}'"))
    }

    pub async fn post_multipart_with_progress<F>(
        &self,
        path: &str,
        field: &str,
        file: &SelectedFile,
        on_progress: F,
    ) -> Result<RawResponse>
    where
        F: FnMut(u64, u64) + Send + Sync + 'static,
    {
        let url = self.resolve(path)?;
        let body = Body::wrap_stream(chunked_with_progress(
            file.content.clone(),
            UPLOAD_CHUNK_BYTES,
            on_progress,
        ));
        let part = Part::stream_with_length(body, file.len()).file_name(file.name.clone());
        let form = Form::new().part(field.to_string(), part);

        let res = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("POST /{path} failed"))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("failed to read /{path} response"))?;
        Ok(RawResponse { status, body })
    }

    /// Posts a JSON body and decodes the JSON reply regardless of HTTP status.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.resolve(path)?;
        let res = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST /{path} failed"))?;
        res.json()
            .await
            .with_context(|| format!("invalid /{path} response body"))
    }

    pub async fn post_empty<R>(&self, path: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = self.resolve(path)?;
        let res = self
            .http
            .post(url)
            .send()
            .await
            .with_context(|| format!("POST /{path} failed"))?;
        res.json()
            .await
            .with_context(|| format!("invalid /{path} response body"))
    }

    pub async fn fetch(&self, location: &str) -> Result<FetchedResource> {
        let url = self.resolve(location)?;
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        if !res.status().is_success() {
            return Err(anyhow!("GET {url} returned {}", res.status()));
        }
        let file_name = res
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_file_name)
            .or_else(|| last_path_segment(&url))
            .unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string());
        let bytes = res
            .bytes()
            .await
            .with_context(|| format!("failed to read body of {url}"))?
            .to_vec();
        Ok(FetchedResource {
            url,
            file_name,
            bytes,
        })
    }
}

fn disposition_file_name(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"'))
        .and_then(sanitize_file_name)
}

fn last_path_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .and_then(sanitize_file_name)
}

fn sanitize_file_name(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(Url::parse(base).expect("url"))
    }

    #[test]
    fn endpoints_resolve_under_base_path() {
        let t = transport("http://127.0.0.1:5000/app");
        assert_eq!(
            t.resolve("upload").expect("resolve").as_str(),
            "http://127.0.0.1:5000/app/upload"
        );
    }

    #[test]
    fn rooted_locations_replace_base_path() {
        let t = transport("http://127.0.0.1:5000/app/");
        assert_eq!(
            t.resolve("/download_report").expect("resolve").as_str(),
            "http://127.0.0.1:5000/download_report"
        );
    }

    #[test]
    fn disposition_name_wins_and_is_stripped_of_paths() {
        assert_eq!(
            disposition_file_name("attachment; filename=\"../report.pdf\""),
            Some("report.pdf".to_string())
        );
        assert_eq!(disposition_file_name("inline"), None);
    }

    #[test]
    fn falls_back_to_last_segment() {
        let url = Url::parse("http://localhost/download_report").expect("url");
        assert_eq!(last_path_segment(&url), Some("download_report".to_string()));
    }
}
