//! Dispatcher performing real HTTP calls with `reqwest`.

use crate::config::HttpConfig;
use crate::descriptor::InvocationDescriptor;
use crate::dispatch::{DispatchResult, Dispatcher, ResponseEntity};
use crate::error::DispatchError;
use crate::multimap::MultiValueMap;
use crate::route::HttpMethod;
use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

/// Full request URL for `descriptor`.
///
/// Placeholders in the endpoint are replaced by their percent-encoded path
/// param; query params follow in insertion order, repeated keys included.
pub fn build_url(descriptor: &InvocationDescriptor) -> String {
    let mut url = descriptor.base_path().trim_end_matches('/').to_string();
    let endpoint = descriptor.endpoint();
    if !endpoint.is_empty() && !endpoint.starts_with('/') {
        url.push('/');
    }
    let mut path = endpoint.to_string();
    for (name, value) in descriptor.path_params() {
        path = path.replace(&format!("{{{name}}}"), &urlencoding::encode(value));
    }
    url.push_str(&path);

    let mut separator = '?';
    for (key, values) in descriptor.query_params().iter() {
        for value in values {
            url.push(separator);
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
            separator = '&';
        }
    }
    url
}

fn to_reqwest(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Options => Method::OPTIONS,
        HttpMethod::Trace => Method::TRACE,
    }
}

/// Non-JSON bodies come back as a JSON string.
fn parse_body(text: String) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

pub struct HttpDispatcher {
    client: Client,
    default_headers: MultiValueMap,
}

impl HttpDispatcher {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            default_headers: config.default_headers.clone(),
        })
    }
}

impl Dispatcher for HttpDispatcher {
    fn dispatch(&self, descriptor: &InvocationDescriptor) -> Result<DispatchResult, DispatchError> {
        let url = build_url(descriptor);
        debug!("{} {}", descriptor.method(), url);

        let mut request = self.client.request(to_reqwest(descriptor.method()), &url);
        for (key, values) in self.default_headers.iter().chain(descriptor.headers().iter()) {
            for value in values {
                request = request.header(key, value);
            }
        }
        if let Some(body) = descriptor.request_body() {
            request = request.json(body);
        }

        let response = request.send()?.error_for_status()?;
        let status = response.status().as_u16();
        let mut headers = MultiValueMap::case_insensitive();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.add(name.as_str(), value);
            }
        }
        let body = parse_body(response.text()?);
        debug!("{} {} -> {}", descriptor.method(), url, status);

        if descriptor.returns_entity() {
            Ok(DispatchResult::Entity(ResponseEntity {
                status,
                headers,
                body,
            }))
        } else {
            Ok(DispatchResult::Body(body))
        }
    }
}

impl std::fmt::Debug for HttpDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::build;
    use crate::route::{MethodId, MethodRoute, Parameter, RequestMapping};
    use serde_json::json;

    fn route() -> MethodRoute {
        MethodRoute::new(MethodId::new("FileApi", "list"), RequestMapping::get("/files/{dir}"))
            .with_class_mapping(RequestMapping::new().path("/v1"))
            .param(Parameter::path("dir"))
            .param(Parameter::query("tag"))
            .param(Parameter::query("q"))
    }

    #[test]
    fn test_build_url_encodes_and_repeats_query() {
        let descriptor = build(
            "https://api.example.com/",
            &route(),
            &[json!("my docs"), json!(["a", "b c"]), json!("x&y")],
        )
        .unwrap();
        assert_eq!(
            build_url(&descriptor),
            "https://api.example.com/v1/files/my%20docs?tag=a&tag=b%20c&q=x%26y"
        );
    }

    #[test]
    fn test_build_url_without_query() {
        let route = MethodRoute::new(MethodId::new("A", "ping"), RequestMapping::get("/ping"));
        let descriptor = build("http://localhost:8080", &route, &[]).unwrap();
        assert_eq!(build_url(&descriptor), "http://localhost:8080/ping");
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(String::new()), None);
        assert_eq!(parse_body(r#"{"ok":true}"#.to_string()), Some(json!({"ok": true})));
        assert_eq!(parse_body("plain".to_string()), Some(json!("plain")));
    }

    #[test]
    fn test_new_from_default_config() {
        assert!(HttpDispatcher::new(&HttpConfig::default()).is_ok());
    }
}
