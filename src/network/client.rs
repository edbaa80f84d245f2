//! HTTP client for making requests to archive services

use crate::config::OutgoingSettings;
use anyhow::Result;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// HTTP response from an archive service
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl HttpResponse {
    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response indicates rate limiting
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// HTTP client wrapper shared by every backend
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    extra_headers: HashMap<String, String>,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        // Per-backend deadlines are enforced by the dispatcher; this is the hard cap
        let cap = settings
            .max_request_timeout
            .unwrap_or(settings.request_timeout)
            .max(settings.request_timeout);
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(cap))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .user_agent(settings.user_agent.clone())
            .gzip(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        let limiter = settings
            .requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));

        Ok(Self {
            client,
            extra_headers: settings.extra_headers.clone(),
            limiter,
        })
    }

    /// POST request with form-encoded body
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse> {
        self.throttle().await;

        let mut req_builder = self.client.post(url);
        for (key, value) in &self.extra_headers {
            req_builder = req_builder.header(key, value);
        }

        let response = req_builder.form(form).send().await?;
        Self::parse_response(response).await
    }

    /// Wait for the outbound rate limiter, if one is configured
    async fn throttle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Parse response into HttpResponse
    async fn parse_response(response: Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string(), v.to_string());
            }
        }

        let text = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            text,
            url,
        })
    }
}
