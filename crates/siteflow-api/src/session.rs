//! Credentials, cached bearer token, and request headers.

use std::collections::BTreeMap;

/// Header name to value. Ordered so the same session always yields the same map.
pub type Headers = BTreeMap<&'static str, String>;

/// Versioned base path of the external API.
pub const DEFAULT_API_PATH: &str = "/ext/api/2.0";

/// Everything needed to open a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub server_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub project_id: String,
    pub family_id: Option<String>,
    /// Base path prepended to every route. Defaults to [`DEFAULT_API_PATH`].
    pub api_path: Option<String>,
}

/// Connection state for one API account.
///
/// The access token is either absent or a non-empty string returned by a
/// successful authentication. It is never expired or refreshed.
#[derive(Debug, Clone)]
pub struct Session {
    server_url: String,
    api_path: String,
    client_id: String,
    client_secret: String,
    project_id: String,
    family_id: Option<String>,
    access_token: Option<String>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let api_path = config
            .api_path
            .unwrap_or_else(|| DEFAULT_API_PATH.to_string());
        let api_path = match api_path.trim().trim_matches('/') {
            "" => String::new(),
            path => format!("/{}", path),
        };
        Self {
            server_url: config.server_url.trim_end_matches('/').to_string(),
            api_path,
            client_id: config.client_id,
            client_secret: config.client_secret,
            project_id: config.project_id,
            family_id: config.family_id.filter(|f| !f.is_empty()),
            access_token: None,
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn family_id(&self) -> Option<&str> {
        self.family_id.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Cache a token. Empty tokens are ignored so the session never holds one.
    pub(crate) fn store_token(&mut self, token: String) -> bool {
        if token.is_empty() {
            return false;
        }
        self.access_token = Some(token);
        true
    }

    pub(crate) fn credentials(&self) -> (&str, &str) {
        (&self.client_id, &self.client_secret)
    }

    /// Server origin without its scheme, used as the `Host` header.
    pub fn host(&self) -> &str {
        let without_scheme = self
            .server_url
            .strip_prefix("https://")
            .or_else(|| self.server_url.strip_prefix("http://"))
            .unwrap_or(&self.server_url);
        without_scheme
            .split('/')
            .next()
            .unwrap_or(without_scheme)
    }

    /// Absolute URL for an API route such as `/flows`.
    pub fn endpoint(&self, route: &str) -> String {
        format!("{}{}{}", self.server_url, self.api_path, route)
    }

    /// Headers for the next request. Pure: depends only on current session state.
    pub fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Accept", "application/json".to_string());
        headers.insert("Content-Type", "application/json".to_string());
        headers.insert("User-Agent", "Mozilla/5.0".to_string());
        headers.insert("Host", self.host().to_string());
        headers.insert("Origin", self.server_url.clone());
        headers.insert("Referer", self.server_url.clone());
        if let Some(token) = &self.access_token {
            headers.insert("Authorization", format!("Bearer {}", token));
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(SessionConfig {
            server_url: "https://poc-ai.siteflow.co/".to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            project_id: "p1".to_string(),
            family_id: Some(String::new()),
            api_path: None,
        })
    }

    #[test]
    fn test_headers_without_token() {
        let headers = session().headers();
        assert_eq!(headers["Host"], "poc-ai.siteflow.co");
        assert_eq!(headers["Origin"], "https://poc-ai.siteflow.co");
        assert_eq!(headers["Referer"], "https://poc-ai.siteflow.co");
        assert_eq!(headers["Accept"], "application/json");
        assert_eq!(headers["Content-Type"], "application/json");
        assert_eq!(headers["User-Agent"], "Mozilla/5.0");
        assert!(!headers.contains_key("Authorization"));
    }

    #[test]
    fn test_headers_are_stable() {
        let mut s = session();
        assert_eq!(s.headers(), s.headers());
        s.store_token("tok1".to_string());
        assert_eq!(s.headers(), s.headers());
        assert_eq!(s.headers()["Authorization"], "Bearer tok1");
    }

    #[test]
    fn test_empty_token_not_stored() {
        let mut s = session();
        assert!(!s.store_token(String::new()));
        assert!(s.access_token().is_none());
    }

    #[test]
    fn test_endpoint_and_family() {
        let s = session();
        assert_eq!(
            s.endpoint("/flows"),
            "https://poc-ai.siteflow.co/ext/api/2.0/flows"
        );
        // Empty family id counts as unset
        assert!(s.family_id().is_none());
    }

    #[test]
    fn test_root_api_path_adds_nothing() {
        for api_path in ["/", "", " // "] {
            let s = Session::new(SessionConfig {
                server_url: "https://sf.test/".to_string(),
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
                project_id: "p1".to_string(),
                family_id: None,
                api_path: Some(api_path.to_string()),
            });
            assert_eq!(s.endpoint("/flows"), "https://sf.test/flows");
        }
    }

    #[test]
    fn test_host_for_plain_http() {
        let s = Session::new(SessionConfig {
            server_url: "http://localhost:8080".to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            project_id: "p1".to_string(),
            family_id: None,
            api_path: Some("api/v3/".to_string()),
        });
        assert_eq!(s.host(), "localhost:8080");
        assert_eq!(s.endpoint("/x"), "http://localhost:8080/api/v3/x");
    }
}
