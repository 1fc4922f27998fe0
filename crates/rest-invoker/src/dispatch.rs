//! The dispatcher seam and the shapes a dispatch can return.

use crate::descriptor::InvocationDescriptor;
use crate::error::DispatchError;
use crate::multimap::MultiValueMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Turns a descriptor into a result, either from mocks or over the wire.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, descriptor: &InvocationDescriptor) -> Result<DispatchResult, DispatchError>;
}

impl<D: Dispatcher + ?Sized> Dispatcher for Arc<D> {
    fn dispatch(&self, descriptor: &InvocationDescriptor) -> Result<DispatchResult, DispatchError> {
        (**self).dispatch(descriptor)
    }
}

/// Status, headers and optional body of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEntity<T = Value> {
    pub status: u16,
    #[serde(
        default = "MultiValueMap::case_insensitive",
        deserialize_with = "crate::multimap::deserialize_headers"
    )]
    pub headers: MultiValueMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<T>,
}

impl<T> ResponseEntity<T> {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: MultiValueMap::case_insensitive(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: T) -> Self {
        self.body = Some(body);
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl ResponseEntity<Value> {
    /// Deserialize the body into `T`, keeping status and headers.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ResponseEntity<T>, serde_json::Error> {
        let body = self.body.map(serde_json::from_value).transpose()?;
        Ok(ResponseEntity {
            status: self.status,
            headers: self.headers,
            body,
        })
    }
}

/// What a dispatch produced.
///
/// The shape follows the declared return type of the invoked method: an
/// entity envelope yields [`DispatchResult::Entity`], anything else yields
/// the body alone.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    Body(Option<Value>),
    Entity(ResponseEntity),
}

impl DispatchResult {
    pub fn is_entity(&self) -> bool {
        matches!(self, DispatchResult::Entity(_))
    }

    /// The body, whichever shape this is.
    pub fn body(&self) -> Option<&Value> {
        match self {
            DispatchResult::Body(body) => body.as_ref(),
            DispatchResult::Entity(entity) => entity.body.as_ref(),
        }
    }

    pub fn into_body(self) -> Option<Value> {
        match self {
            DispatchResult::Body(body) => body,
            DispatchResult::Entity(entity) => entity.body,
        }
    }

    pub fn entity(&self) -> Option<&ResponseEntity> {
        match self {
            DispatchResult::Entity(entity) => Some(entity),
            DispatchResult::Body(_) => None,
        }
    }

    pub fn into_entity(self) -> Option<ResponseEntity> {
        match self {
            DispatchResult::Entity(entity) => Some(entity),
            DispatchResult::Body(_) => None,
        }
    }
}
