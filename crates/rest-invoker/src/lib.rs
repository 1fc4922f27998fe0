//! Declarative REST API invocation with a programmable mock dispatcher.
//!
//! An API is declared as an [`ApiContract`]: a set of methods, each carrying
//! routing metadata (HTTP verb, path template, content negotiation) and a
//! binding for every parameter (header, path, query or body). At call time
//! the [`descriptor::build`] function resolves the metadata and the live
//! arguments into an [`InvocationDescriptor`], which a [`Dispatcher`] turns
//! into a result.
//!
//! Two dispatchers ship with the crate:
//! - [`MockDispatcher`]: an ordered registry of matcher/provider pairs where
//!   the earliest registered match wins. Used to substitute canned responses
//!   in tests.
//! - `HttpDispatcher` (feature `http`): performs the call with `reqwest`.
//!
//! # Example
//!
//! ```
//! use rest_invoker::{
//!     ApiContract, HttpMethod, InMemoryProvider, MethodDecl, MockDispatcher,
//!     MockMatcherBuilder, Parameter, RequestMapping, RestClient, TypeDescriptor,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let contract = ApiContract::new("UserApi")
//!     .with_mapping(RequestMapping::new().path("/api"))
//!     .method(
//!         "get_user",
//!         MethodDecl::new(RequestMapping::get("/users/{id}"))
//!             .param(Parameter::path("id"))
//!             .returns(TypeDescriptor::named("User")),
//!     );
//!
//! let mocks = Arc::new(MockDispatcher::new());
//! let provider = InMemoryProvider::new();
//! provider.status(200).body(json!({"id": 42}));
//! mocks.add_mock(
//!     MockMatcherBuilder::new()
//!         .http_method().is_equals_to(HttpMethod::Get)
//!         .path_params().contains_key("id")
//!         .build(),
//!     provider,
//! );
//!
//! let client = RestClient::new("http://localhost", &contract, mocks.clone());
//! let user = client.invoke("get_user", &[json!(42)]).unwrap();
//! assert_eq!(user.body(), Some(&json!({"id": 42})));
//! ```

pub mod client;
pub mod config;
pub mod contract;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod matcher;
pub mod mock;
pub mod multimap;
pub mod response_type;
pub mod route;

#[cfg(feature = "http")]
pub mod http;

pub use client::RestClient;
pub use config::{ClientConfig, HttpConfig};
pub use contract::{ApiContract, MethodDecl};
pub use descriptor::{build, InvocationDescriptor, PathParams};
pub use dispatch::{DispatchResult, Dispatcher, ResponseEntity};
pub use error::{
    BindingError, BuildError, ConfigurationError, DispatchError, InvokeError, ProviderError,
};
pub use matcher::{DescriptorMatcher, FieldMatcher, MockMatcher, MockMatcherBuilder};
pub use mock::{FixtureProvider, InMemoryProvider, MockDispatcher, MockResponse, ResponseProvider};
pub use multimap::MultiValueMap;
pub use response_type::TypeDescriptor;
pub use route::{Binding, BindingKind, HttpMethod, MethodId, MethodRoute, Parameter, RequestMapping};

#[cfg(feature = "http")]
pub use http::HttpDispatcher;
