use crate::http_client::HttpClient;
use axum::http::{Method, StatusCode};
use bytes::Bytes;
use mime::APPLICATION_JSON;
use reqwest::header;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

/// Header the vendor reads credentials from.
pub const ACCESS_KEY_HEADER: &str = "AccessKey";

/// Path parameter that identifies a video library.
pub const LIBRARY_ID_PARAM: &str = "libraryId";

/// The two vendor APIs that routes are forwarded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorApi {
    /// Account-wide management API.
    Account,
    /// Video library (stream) API.
    Stream,
}

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("failed to communicate with the vendor: {0}")]
    Send(#[from] reqwest::Error),
    #[error("no value was captured for path parameter '{0}'")]
    MissingParam(String),
    #[error("path parameter '{0}' is a dot segment")]
    DotSegment(String),
    #[error("vendor base url '{0}' cannot be used as a base")]
    CannotBeABase(Url),
}

/// A request that should be sent to the vendor on behalf of a client.
pub struct ForwardRequest<'a> {
    pub api: VendorApi,
    pub method: Method,
    /// Upstream path template using `{param}` captures, relative to the API base.
    pub upstream: &'a str,
    pub params: &'a HashMap<String, String>,
    /// Raw query string, forwarded unchanged.
    pub query: Option<&'a str>,
    /// Credential for the `AccessKey` header, omitted when [`None`].
    pub access_key: Option<&'a str>,
    pub body: Bytes,
}

#[derive(Deserialize)]
struct LibraryDetails {
    #[serde(rename = "ApiKey")]
    api_key: Option<String>,
}

#[derive(Debug)]
pub struct Forwarder {
    client: HttpClient,
    account_key: String,
    account_base: Url,
    stream_base: Url,
}

impl Forwarder {
    pub fn new(
        client: HttpClient,
        account_key: String,
        account_base: Url,
        stream_base: Url,
    ) -> Self {
        Self {
            client,
            account_key,
            account_base,
            stream_base,
        }
    }

    pub fn account_key(&self) -> &str {
        &self.account_key
    }

    /// Build the vendor URL for an upstream path template.
    ///
    /// Each capture is pushed as its own percent-encoded path segment. Captures
    /// equal to `.` or `..` are rejected as they would be resolved away.
    pub fn upstream_url(
        &self,
        api: VendorApi,
        template: &str,
        params: &HashMap<String, String>,
        query: Option<&str>,
    ) -> Result<Url, ForwardError> {
        let mut url = self.base_for(api).clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ForwardError::CannotBeABase(self.base_for(api).clone()))?;
            segments.pop_if_empty();
            for segment in template.split('/').filter(|s| !s.is_empty()) {
                match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Some(name) => {
                        let value = params
                            .get(name)
                            .ok_or_else(|| ForwardError::MissingParam(name.to_owned()))?;
                        if value == "." || value == ".." {
                            return Err(ForwardError::DotSegment(name.to_owned()));
                        }
                        segments.push(value);
                    }
                    None => {
                        segments.push(segment);
                    }
                }
            }
        }
        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url)
    }

    fn base_for(&self, api: VendorApi) -> &Url {
        match api {
            VendorApi::Account => &self.account_base,
            VendorApi::Stream => &self.stream_base,
        }
    }

    /// Send a request to the vendor and return its raw response.
    pub async fn forward(
        &self,
        request: ForwardRequest<'_>,
    ) -> Result<reqwest::Response, ForwardError> {
        let url = self.upstream_url(
            request.api,
            request.upstream,
            request.params,
            request.query,
        )?;
        debug!("Forwarding {} request to {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method, url)
            .header(header::ACCEPT, APPLICATION_JSON.essence_str());
        if let Some(access_key) = request.access_key {
            builder = builder.header(ACCESS_KEY_HEADER, access_key);
        }
        if !request.body.is_empty() {
            builder = builder
                .header(header::CONTENT_TYPE, APPLICATION_JSON.essence_str())
                .body(request.body);
        }

        Ok(builder.send().await?)
    }

    /// Fetch the dedicated access key of a video library using the account key.
    ///
    /// Makes exactly one request. Returns [`None`] when the vendor does not
    /// hand out a key, for example because the library does not exist.
    pub async fn library_key(&self, library_id: &str) -> Result<Option<String>, ForwardError> {
        let params = HashMap::from([(LIBRARY_ID_PARAM.to_owned(), library_id.to_owned())]);
        let response = self
            .forward(ForwardRequest {
                api: VendorApi::Account,
                method: Method::GET,
                upstream: "videolibrary/{libraryId}",
                params: &params,
                query: Some("includeAccessKey=true"),
                access_key: Some(self.account_key.as_str()),
                body: Bytes::new(),
            })
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        match serde_json::from_slice::<LibraryDetails>(&body) {
            Ok(LibraryDetails {
                api_key: Some(api_key),
            }) => Ok(Some(api_key)),
            Ok(_) => {
                debug!("Vendor returned no access key for library {library_id} ({status})");
                Ok(None)
            }
            Err(err) => {
                warn!("Unable to read library details for {library_id} ({status}): {err}");
                Ok(None)
            }
        }
    }

    /// Status code the vendor answers with on the account API root.
    pub async fn vendor_status(&self) -> Result<StatusCode, ForwardError> {
        let response = self
            .client
            .get(self.account_base.clone())
            .header(ACCESS_KEY_HEADER, &self.account_key)
            .header(header::ACCEPT, APPLICATION_JSON.essence_str())
            .send()
            .await?;
        Ok(response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forwarder() -> Forwarder {
        Forwarder::new(
            reqwest::Client::new(),
            "account-key".to_owned(),
            Url::parse("https://api.bunny.net").unwrap(),
            Url::parse("https://video.bunnycdn.com/").unwrap(),
        )
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn upstream_url_without_captures() {
        let url = forwarder()
            .upstream_url(VendorApi::Account, "country", &HashMap::new(), None)
            .unwrap();
        assert_eq!(url.as_str(), "https://api.bunny.net/country");
    }

    #[test]
    fn upstream_url_substitutes_captures_and_query() {
        let url = forwarder()
            .upstream_url(
                VendorApi::Stream,
                "library/{libraryId}/videos/{videoId}/captions/{srclang}",
                &params(&[("libraryId", "42"), ("videoId", "abc"), ("srclang", "en")]),
                Some("page=2&itemsPerPage=10"),
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://video.bunnycdn.com/library/42/videos/abc/captions/en?page=2&itemsPerPage=10"
        );
    }

    #[test]
    fn upstream_url_encodes_capture_values() {
        let url = forwarder()
            .upstream_url(
                VendorApi::Account,
                "storagezone/{storageZoneId}",
                &params(&[("storageZoneId", "a/b c")]),
                Some(""),
            )
            .unwrap();
        assert_eq!(url.as_str(), "https://api.bunny.net/storagezone/a%2Fb%20c");
    }

    #[test]
    fn upstream_url_rejects_dot_segments() {
        for value in [".", ".."] {
            let err = forwarder()
                .upstream_url(
                    VendorApi::Stream,
                    "/library/{libraryId}/collections",
                    &params(&[("libraryId", value)]),
                    None,
                )
                .unwrap_err();
            assert!(matches!(err, ForwardError::DotSegment(name) if name == "libraryId"));
        }

        let url = forwarder()
            .upstream_url(
                VendorApi::Account,
                "storagezone/{storageZoneId}",
                &params(&[("storageZoneId", "...")]),
                None,
            )
            .unwrap();
        assert_eq!(url.as_str(), "https://api.bunny.net/storagezone/...");
    }

    #[test]
    fn upstream_url_keeps_base_path() {
        let forwarder = Forwarder::new(
            reqwest::Client::new(),
            "account-key".to_owned(),
            Url::parse("http://127.0.0.1:9000/account/").unwrap(),
            Url::parse("http://127.0.0.1:9000/stream").unwrap(),
        );
        let url = forwarder
            .upstream_url(VendorApi::Account, "region", &HashMap::new(), None)
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/account/region");
    }

    #[test]
    fn upstream_url_reports_missing_capture() {
        let err = forwarder()
            .upstream_url(VendorApi::Stream, "library/{libraryId}", &HashMap::new(), None)
            .unwrap_err();
        assert!(matches!(err, ForwardError::MissingParam(name) if name == "libraryId"));
    }
}
