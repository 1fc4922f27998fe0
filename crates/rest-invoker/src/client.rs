//! Client object standing in for a generated API implementation.
//!
//! Routes are computed once from the contract when the client is created;
//! each call builds a descriptor from the stored route and the arguments,
//! then hands it to the dispatcher.

use crate::config::ClientConfig;
use crate::contract::ApiContract;
use crate::descriptor::{self, InvocationDescriptor};
use crate::dispatch::{DispatchResult, Dispatcher, ResponseEntity};
use crate::error::{BuildError, ConfigurationError, InvokeError};
use crate::route::MethodRoute;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub struct RestClient {
    api: String,
    base_path: String,
    routes: HashMap<String, Arc<MethodRoute>>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl RestClient {
    pub fn new(
        base_path: impl Into<String>,
        contract: &ApiContract,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        let routes = contract
            .routes()
            .map(|(name, route)| (name.to_string(), Arc::new(route)))
            .collect();
        Self {
            api: contract.name.clone(),
            base_path: base_path.into(),
            routes,
            dispatcher,
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        contract: &ApiContract,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self::new(config.base_path.clone(), contract, dispatcher)
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn route(&self, method: &str) -> Result<&MethodRoute, ConfigurationError> {
        self.routes
            .get(method)
            .map(Arc::as_ref)
            .ok_or_else(|| ConfigurationError::UnknownMethod {
                declaring_type: self.api.clone(),
                method: method.to_string(),
            })
    }

    /// Build the descriptor for a call without dispatching it.
    pub fn describe(&self, method: &str, args: &[Value]) -> Result<InvocationDescriptor, BuildError> {
        let route = self.route(method)?;
        descriptor::build(&self.base_path, route, args)
    }

    pub fn invoke(&self, method: &str, args: &[Value]) -> Result<DispatchResult, InvokeError> {
        let descriptor = self.describe(method, args)?;
        Ok(self.dispatcher.dispatch(&descriptor)?)
    }

    /// Invoke and deserialize the body. An absent body decodes from `null`.
    pub fn invoke_as<T: DeserializeOwned>(&self, method: &str, args: &[Value]) -> Result<T, InvokeError> {
        let body = self.invoke(method, args)?.into_body().unwrap_or(Value::Null);
        Ok(serde_json::from_value(body)?)
    }

    /// Invoke and return status, headers and decoded body.
    ///
    /// Methods not declared to return an entity get a 200 envelope around
    /// their body.
    pub fn invoke_entity<T: DeserializeOwned>(
        &self,
        method: &str,
        args: &[Value],
    ) -> Result<ResponseEntity<T>, InvokeError> {
        let entity = match self.invoke(method, args)? {
            DispatchResult::Entity(entity) => entity,
            DispatchResult::Body(body) => ResponseEntity {
                body,
                ..ResponseEntity::new(crate::mock::DEFAULT_STATUS)
            },
        };
        Ok(entity.decode()?)
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("api", &self.api)
            .field("base_path", &self.base_path)
            .field("methods", &self.routes.len())
            .finish()
    }
}
