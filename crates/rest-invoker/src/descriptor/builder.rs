//! Resolution of route metadata plus live arguments into a descriptor.

use super::{InvocationDescriptor, PathParams};
use crate::error::{BindingError, BuildError, ConfigurationError};
use crate::multimap::MultiValueMap;
use crate::route::{Binding, BindingKind, MethodId, MethodRoute, RequestMapping};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

const CONTENT_TYPE: &str = "Content-Type";
const ACCEPT: &str = "Accept";

/// One `{name}` token; several may share a segment.
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(?P<name>[^{}/]+)\}").expect("valid placeholder regex"));

/// String form of an argument value.
///
/// Strings are used raw, every other value as compact JSON text.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Join class-level and method-level paths.
///
/// Exactly one `/` separates the class path from the method path.
pub fn join_endpoint(class_path: Option<&str>, method_path: Option<&str>) -> String {
    let mut endpoint = String::new();
    if let Some(class_path) = class_path {
        endpoint.push_str(class_path);
        if !class_path.ends_with('/') {
            endpoint.push('/');
        }
    }
    if let Some(method_path) = method_path {
        if endpoint.is_empty() {
            endpoint.push_str(method_path);
        } else {
            endpoint.push_str(method_path.trim_start_matches('/'));
        }
    }
    endpoint
}

/// Placeholder names in `endpoint`, in order of first appearance.
pub fn placeholders(endpoint: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(endpoint) {
        let name = caps["name"].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Method-level value, falling back to the class-level one when the method
/// declares none.
fn negotiated<'a>(
    class_mapping: Option<&'a RequestMapping>,
    method_mapping: &'a RequestMapping,
    select: impl Fn(&'a RequestMapping) -> Option<&'a str>,
) -> Option<&'a str> {
    select(method_mapping).or_else(|| class_mapping.and_then(&select))
}

/// Build the descriptor for one call of `route` with `args`.
///
/// `args` is positional and must have one entry per declared parameter.
pub fn build(
    base_path: &str,
    route: &MethodRoute,
    args: &[Value],
) -> Result<InvocationDescriptor, BuildError> {
    let id = &route.id;
    let method_mapping = route
        .mapping
        .as_ref()
        .ok_or_else(|| ConfigurationError::MissingMapping(id.clone()))?;
    let class_mapping = route.class_mapping.as_ref();

    let method = method_mapping
        .first_method()
        .ok_or_else(|| ConfigurationError::MissingHttpMethod(id.clone()))?;

    let endpoint = join_endpoint(
        class_mapping.and_then(RequestMapping::first_path),
        method_mapping.first_path(),
    );
    if is_blank(&endpoint) {
        return Err(ConfigurationError::BlankEndpoint(id.clone()).into());
    }

    if args.len() != route.parameters.len() {
        return Err(ConfigurationError::ArgumentCount {
            method: id.clone(),
            expected: route.parameters.len(),
            actual: args.len(),
        }
        .into());
    }
    let bodies = route
        .parameters
        .iter()
        .filter(|p| p.kind() == Some(BindingKind::Body))
        .count();
    if bodies > 1 {
        return Err(ConfigurationError::MultipleBodies(id.clone()).into());
    }

    let mut headers = MultiValueMap::case_insensitive();
    if let Some(content_type) = negotiated(class_mapping, method_mapping, RequestMapping::first_consumes)
        .filter(|v| !is_blank(v))
    {
        headers.add(CONTENT_TYPE, content_type);
    }
    if let Some(accept) = negotiated(class_mapping, method_mapping, RequestMapping::first_produces)
        .filter(|v| !is_blank(v))
    {
        headers.add(ACCEPT, accept);
    }

    let mut path_params = PathParams::new();
    let mut query_params = MultiValueMap::new();
    let mut request_body = None;

    for (parameter, value) in route.parameters.iter().zip(args) {
        let Some(binding) = parameter.binding.as_ref() else {
            continue;
        };
        let key = binding.resolve_key(&parameter.name);
        match binding.kind {
            BindingKind::Header => bind_header(&mut headers, id, binding, key, value)?,
            BindingKind::Path => {
                if value.is_null() {
                    return Err(BindingError::NullPathParam {
                        method: id.clone(),
                        key: key.to_string(),
                    }
                    .into());
                }
                path_params.insert(key.to_string(), stringify(value));
            }
            BindingKind::Query => bind_query(&mut query_params, id, binding, key, value)?,
            BindingKind::Body => {
                if !value.is_null() {
                    request_body = Some(value.clone());
                }
            }
        }
    }

    let unresolved: Vec<String> = placeholders(&endpoint)
        .into_iter()
        .filter(|name| !path_params.contains_key(name))
        .collect();
    if !unresolved.is_empty() {
        return Err(BindingError::UnresolvedPathParams {
            method: id.clone(),
            names: unresolved,
        }
        .into());
    }

    let declared_response_type = route.return_type.clone();
    let response_type = declared_response_type.unwrap_entity().clone();

    debug!("Built descriptor for {}: {} {}", id, method, endpoint);

    Ok(InvocationDescriptor {
        method_id: id.clone(),
        base_path: base_path.to_string(),
        endpoint,
        method,
        headers,
        path_params,
        query_params,
        request_body,
        response_type,
        declared_response_type,
    })
}

fn bind_header(
    headers: &mut MultiValueMap,
    id: &MethodId,
    binding: &Binding,
    key: &str,
    value: &Value,
) -> Result<(), BindingError> {
    match value {
        Value::Null if binding.required => Err(BindingError::MissingHeader {
            method: id.clone(),
            key: key.to_string(),
        }),
        Value::Null => Ok(()),
        Value::Array(items) => {
            headers.add_all(key, items.iter().map(stringify));
            Ok(())
        }
        scalar => {
            headers.add(key, stringify(scalar));
            Ok(())
        }
    }
}

fn bind_query(
    query: &mut MultiValueMap,
    id: &MethodId,
    binding: &Binding,
    key: &str,
    value: &Value,
) -> Result<(), BindingError> {
    match value {
        Value::Null if binding.required => Err(BindingError::MissingQueryParam {
            method: id.clone(),
            key: key.to_string(),
        }),
        Value::Null => Ok(()),
        Value::Array(items) => {
            query.add_all(key, items.iter().map(stringify));
            Ok(())
        }
        scalar => {
            let mut text = stringify(scalar);
            if is_blank(&text) {
                if let Some(default) = binding.default_value.as_ref() {
                    text = default.clone();
                }
            }
            query.add(key, text);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response_type::TypeDescriptor;
    use crate::route::{HttpMethod, Parameter};
    use proptest::prelude::*;
    use serde_json::json;

    fn route(mapping: RequestMapping) -> MethodRoute {
        MethodRoute::new(MethodId::new("UserApi", "call"), mapping)
    }

    #[test]
    fn test_path_param_scenario() {
        let route = route(RequestMapping::get("/users/{id}"))
            .with_class_mapping(RequestMapping::new().path("/api"))
            .param(Parameter::path("id"));

        let descriptor = build("http://localhost", &route, &[json!(42)]).unwrap();

        assert_eq!(descriptor.endpoint(), "/api/users/{id}");
        assert_eq!(descriptor.method(), HttpMethod::Get);
        assert_eq!(descriptor.path_params().get("id").map(String::as_str), Some("42"));
        assert_eq!(descriptor.base_path(), "http://localhost");
    }

    #[test]
    fn test_class_path_with_trailing_slash() {
        assert_eq!(join_endpoint(Some("/api/"), Some("users")), "/api/users");
        assert_eq!(join_endpoint(Some("/api"), Some("users")), "/api/users");
        assert_eq!(join_endpoint(Some("/api/"), Some("/users")), "/api/users");
        assert_eq!(join_endpoint(None, Some("/users")), "/users");
        assert_eq!(join_endpoint(Some("/api"), None), "/api/");
    }

    #[test]
    fn test_missing_mapping_and_method() {
        let mut no_mapping = route(RequestMapping::new());
        no_mapping.mapping = None;
        assert_eq!(
            build("", &no_mapping, &[]),
            Err(ConfigurationError::MissingMapping(no_mapping.id.clone()).into())
        );

        let no_verb = route(RequestMapping::new().path("/users"));
        assert!(matches!(
            build("", &no_verb, &[]),
            Err(BuildError::Configuration(ConfigurationError::MissingHttpMethod(_)))
        ));
    }

    #[test]
    fn test_blank_endpoint() {
        let blank = route(RequestMapping::new().method(HttpMethod::Get).path("  "));
        assert!(matches!(
            build("", &blank, &[]),
            Err(BuildError::Configuration(ConfigurationError::BlankEndpoint(_)))
        ));
    }

    #[test]
    fn test_first_declared_verb_wins() {
        let route = route(
            RequestMapping::new()
                .method(HttpMethod::Put)
                .method(HttpMethod::Post)
                .path("/x"),
        );
        assert_eq!(build("", &route, &[]).unwrap().method(), HttpMethod::Put);
    }

    #[test]
    fn test_content_negotiation_fallback() {
        let route = route(RequestMapping::post("/users").produces("application/xml"))
            .with_class_mapping(
                RequestMapping::new()
                    .path("/api")
                    .consumes("application/json")
                    .produces("application/json"),
            );
        let descriptor = build("", &route, &[]).unwrap();

        assert_eq!(descriptor.headers().first("content-type"), Some("application/json"));
        assert_eq!(descriptor.headers().first("Accept"), Some("application/xml"));
    }

    #[test]
    fn test_blank_content_type_is_skipped() {
        let route = route(RequestMapping::get("/users").consumes(" "));
        let descriptor = build("", &route, &[]).unwrap();
        assert!(descriptor.headers().is_empty());
    }

    #[test]
    fn test_required_header_null_fails() {
        let route = route(RequestMapping::get("/me")).param(Parameter::header("auth").named("Authorization"));
        let err = build("", &route, &[Value::Null]).unwrap_err();

        match err {
            BuildError::Binding(binding) => assert_eq!(binding.keys(), vec!["Authorization"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_optional_header_null_is_skipped() {
        let route = route(RequestMapping::get("/me")).param(Parameter::header("X-Trace").optional());
        let descriptor = build("", &route, &[Value::Null]).unwrap();
        assert!(!descriptor.headers().contains_key("X-Trace"));
    }

    #[test]
    fn test_header_sequence_repeats_values() {
        let route = route(RequestMapping::get("/me")).param(Parameter::header("X-Tag"));
        let descriptor = build("", &route, &[json!(["a", 1, true])]).unwrap();
        assert_eq!(
            descriptor.headers().get("x-tag").unwrap(),
            &["a".to_string(), "1".to_string(), "true".to_string()]
        );
    }

    #[test]
    fn test_null_path_param_fails() {
        let route = route(RequestMapping::get("/users/{id}")).param(Parameter::path("id"));
        assert!(matches!(
            build("", &route, &[Value::Null]),
            Err(BuildError::Binding(BindingError::NullPathParam { .. }))
        ));
    }

    #[test]
    fn test_query_binding_rules() {
        let route = route(RequestMapping::get("/search"))
            .param(Parameter::query("q"))
            .param(Parameter::query("page").optional())
            .param(Parameter::query("size").default_value("20"))
            .param(Parameter::query("tag"));

        let descriptor = build(
            "",
            &route,
            &[json!("rust"), Value::Null, json!(""), json!(["a", "b"])],
        )
        .unwrap();
        let query = descriptor.query_params();

        assert_eq!(query.first("q"), Some("rust"));
        assert!(!query.contains_key("page"));
        assert_eq!(query.first("size"), Some("20"));
        assert_eq!(query.get("tag").unwrap(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_blank_query_without_default_keeps_value() {
        let route = route(RequestMapping::get("/search")).param(Parameter::query("q"));
        let descriptor = build("", &route, &[json!("")]).unwrap();
        assert_eq!(descriptor.query_params().first("q"), Some(""));
    }

    #[test]
    fn test_required_query_null_fails() {
        let route = route(RequestMapping::get("/search")).param(Parameter::query("q"));
        assert!(matches!(
            build("", &route, &[Value::Null]),
            Err(BuildError::Binding(BindingError::MissingQueryParam { .. }))
        ));
    }

    #[test]
    fn test_body_stored_verbatim_and_unbound_ignored() {
        let route = route(RequestMapping::post("/users"))
            .param(Parameter::unbound("ctx"))
            .param(Parameter::body("user"));
        let body = json!({"name": "Ada", "tags": [1, 2]});
        let descriptor = build("", &route, &[json!("ignored"), body.clone()]).unwrap();

        assert_eq!(descriptor.request_body(), Some(&body));
        assert!(descriptor.headers().is_empty());
        assert!(descriptor.query_params().is_empty());
    }

    #[test]
    fn test_multiple_bodies_rejected() {
        let route = route(RequestMapping::post("/users"))
            .param(Parameter::body("a"))
            .param(Parameter::body("b"));
        assert!(matches!(
            build("", &route, &[json!(1), json!(2)]),
            Err(BuildError::Configuration(ConfigurationError::MultipleBodies(_)))
        ));
    }

    #[test]
    fn test_argument_count_mismatch() {
        let route = route(RequestMapping::get("/users/{id}")).param(Parameter::path("id"));
        assert!(matches!(
            build("", &route, &[]),
            Err(BuildError::Configuration(ConfigurationError::ArgumentCount {
                expected: 1,
                actual: 0,
                ..
            }))
        ));
    }

    #[test]
    fn test_unresolved_placeholders_reported_together() {
        let route = route(RequestMapping::get("/orgs/{org}/repos/{repo}/issues/{n}"))
            .param(Parameter::path("repo"));
        let err = build("", &route, &[json!("x")]).unwrap_err();

        match err {
            BuildError::Binding(binding) => assert_eq!(binding.keys(), vec!["org", "n"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_several_placeholders_in_one_segment() {
        let route = route(RequestMapping::get("/range/{from}-{to}"))
            .param(Parameter::path("from"))
            .param(Parameter::path("to"));
        let descriptor = build("http://h", &route, &[json!(1), json!(2)]).unwrap();

        assert_eq!(descriptor.path_params().get("from").map(String::as_str), Some("1"));
        assert_eq!(descriptor.path_params().get("to").map(String::as_str), Some("2"));
        assert_eq!(placeholders("/range/{from}-{to}/{from}"), vec!["from", "to"]);
    }

    #[test]
    fn test_placeholder_inside_segment_must_be_bound() {
        let route = route(RequestMapping::get("/files/{name}.json"));
        let err = build("http://h", &route, &[]).unwrap_err();

        match err {
            BuildError::Binding(binding) => assert_eq!(binding.keys(), vec!["name"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_entity_return_type_is_unwrapped() {
        let route = route(RequestMapping::get("/users"))
            .returns("ResponseEntity<List<User>>".parse().unwrap());
        let descriptor = build("", &route, &[]).unwrap();

        assert_eq!(descriptor.response_type().to_string(), "List<User>");
        assert!(descriptor.returns_entity());
        assert!(descriptor.declared_response_type().is_entity());
    }

    #[test]
    fn test_plain_return_type_kept() {
        let route = route(RequestMapping::get("/users")).returns(TypeDescriptor::named("User"));
        let descriptor = build("", &route, &[]).unwrap();
        assert_eq!(descriptor.response_type(), &TypeDescriptor::named("User"));
        assert!(!descriptor.returns_entity());
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(&json!("a b")), "a b");
        assert_eq!(stringify(&json!(1.5)), "1.5");
        assert_eq!(stringify(&json!(false)), "false");
        assert_eq!(stringify(&json!({"k": 1})), r#"{"k":1}"#);
    }

    #[test]
    fn test_display_renders_fields() {
        let route = route(RequestMapping::get("/users/{id}")).param(Parameter::path("id"));
        let rendered = build("http://h", &route, &[json!(7)]).unwrap().to_string();

        assert!(rendered.contains("Endpoint: /users/{id}"));
        assert!(rendered.contains("id -> 7"));
        assert!(rendered.contains("HTTP Headers: N/A"));
    }

    proptest! {
        #[test]
        fn prop_endpoint_join(p1 in "/[a-z]{1,8}", p2 in "[a-z]{1,8}") {
            prop_assert_eq!(join_endpoint(Some(&p1), Some(&p2)), format!("{}/{}", p1, p2));
            let with_slash = format!("{p1}/");
            prop_assert_eq!(join_endpoint(Some(&with_slash), Some(&p2)), format!("{}{}", with_slash, p2));
        }

        #[test]
        fn prop_unresolved_placeholder_is_named(name in "[a-z]{1,8}") {
            let route = route(RequestMapping::get(format!("/items/{{{name}}}")));
            let err = build("", &route, &[]).unwrap_err();
            prop_assert_eq!(
                err,
                BuildError::Binding(BindingError::UnresolvedPathParams {
                    method: MethodId::new("UserApi", "call"),
                    names: vec![name],
                })
            );
        }
    }
}
