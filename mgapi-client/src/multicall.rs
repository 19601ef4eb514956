//! Multicall building and positional result handling
//!
//! The service batches calls through a single `ExecuteMultiCall` method
//! whose params are `{ "calls": [{ "method", "params" }, ...] }`. The
//! result is an array holding one entry per call, in the same order.
//! Batching is positional: results are addressed by the index the call was
//! added at, not by an id.
//!
//! If any sub-call fails the whole multicall fails with one remote error
//! whose nested `errors` describe the failing call.
//!
//! # Examples
//!
//! ```rust,no_run
//! use mgapi_client::{MgClient, MultiCall};
//! use serde_json::json;
//!
//! # async fn example(client: &MgClient) -> mgapi_core::Result<()> {
//! let mut batch = MultiCall::new();
//! let users = batch.add("Get", json!({"typeName": "User"}))?;
//! let version = batch.add("GetVersion", ())?;
//!
//! let responses = client.execute(batch).await?;
//!
//! let users: Vec<serde_json::Value> = responses.get(users)?;
//! let version: String = responses.get(version)?;
//! # Ok(())
//! # }
//! ```

use mgapi_core::{params_from_value, Error, MultiCallEntry, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Builder for an `ExecuteMultiCall` batch
#[derive(Debug, Clone, Default)]
pub struct MultiCall {
    calls: Vec<MultiCallEntry>,
}

impl MultiCall {
    /// Create an empty batch
    pub fn new() -> Self {
        Self { calls: Vec::new() }
    }

    /// Build a batch from `(method, params)` pairs
    ///
    /// Missing params default to an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for an empty method name or params
    /// that are not an object.
    pub fn from_pairs<I, M>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (M, Option<Value>)>,
        M: Into<String>,
    {
        let mut batch = Self::new();
        for (method, params) in pairs {
            batch.add(method, params)?;
        }
        Ok(batch)
    }

    /// Add a call and return its position in the result list
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for an empty method name or params
    /// that do not serialize to an object (`()` and `None` give `{}`).
    pub fn add<P>(&mut self, method: impl Into<String>, params: P) -> Result<usize>
    where
        P: Serialize,
    {
        let method = method.into();
        if method.trim().is_empty() {
            return Err(Error::InvalidArgument(format!(
                "Must provide method for call {}",
                self.calls.len()
            )));
        }

        let value = serde_json::to_value(params).map_err(|e| Error::Serialization(e.to_string()))?;
        let params = params_from_value(value)?;

        self.calls.push(MultiCallEntry { method, params });
        Ok(self.calls.len() - 1)
    }

    /// Number of calls in the batch
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Method names, in batch order
    pub fn methods(&self) -> Vec<&str> {
        self.calls.iter().map(|c| c.method.as_str()).collect()
    }

    /// Params of the `ExecuteMultiCall` call
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for an empty batch.
    pub(crate) fn into_params(self) -> Result<Map<String, Value>> {
        if self.calls.is_empty() {
            return Err(Error::InvalidArgument("Must provide calls".to_string()));
        }

        let mut params = Map::new();
        params.insert("calls".to_string(), json!(self.calls));
        Ok(params)
    }
}

/// Positional results of an executed multicall
#[derive(Debug, Clone, PartialEq)]
pub struct MultiCallResponse {
    results: Vec<Value>,
}

impl MultiCallResponse {
    /// Wrap the raw `ExecuteMultiCall` result
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` if the result is not an array of exactly
    /// `expected` entries.
    pub fn from_result(result: Value, expected: usize) -> Result<Self> {
        let results = match result {
            Value::Array(results) => results,
            other => {
                return Err(Error::Decode(format!(
                    "Multicall result is not an array: {}",
                    other
                )))
            }
        };

        if results.len() != expected {
            return Err(Error::Decode(format!(
                "Multicall returned {} results for {} calls",
                results.len(),
                expected
            )));
        }

        Ok(Self { results })
    }

    /// Typed result of the call at `index`
    pub fn get<R>(&self, index: usize) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let value = self.results.get(index).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "No result at index {} ({} results)",
                index,
                self.results.len()
            ))
        })?;

        serde_json::from_value(value.clone()).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Number of results
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if there are no results
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Take the results in call order
    pub fn into_results(self) -> Vec<Value> {
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_missing_params() {
        let mut batch = MultiCall::new();

        let first = batch.add("Get", json!({"typeName": "User"})).unwrap();
        let second = batch.add("GetVersion", ()).unwrap();
        let third = batch.add("GetSystemTimeUtc", None::<Value>).unwrap();

        assert_eq!((first, second, third), (0, 1, 2));
        assert_eq!(batch.len(), 3);

        let params = batch.into_params().unwrap();
        assert_eq!(
            params["calls"],
            json!([
                {"method": "Get", "params": {"typeName": "User"}},
                {"method": "GetVersion", "params": {}},
                {"method": "GetSystemTimeUtc", "params": {}}
            ])
        );
    }

    #[test]
    fn test_empty_batch_is_invalid_argument() {
        assert!(matches!(
            MultiCall::new().into_params(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rejects_empty_method_and_non_object_params() {
        let mut batch = MultiCall::new();
        assert!(matches!(batch.add("", ()), Err(Error::InvalidArgument(_))));
        assert!(matches!(batch.add("Get", json!("User")), Err(Error::InvalidArgument(_))));
        assert!(batch.is_empty());
    }

    #[test]
    fn test_from_pairs_keeps_order() {
        let batch = MultiCall::from_pairs(vec![
            ("Get", Some(json!({"typeName": "Device"}))),
            ("GetVersion", None),
        ])
        .unwrap();

        assert_eq!(batch.methods(), vec!["Get", "GetVersion"]);
    }

    #[test]
    fn test_response_is_positional() {
        let response =
            MultiCallResponse::from_result(json!([[{"name": "user@example.com"}], "5.7.22334.11"]), 2).unwrap();

        let users: Vec<Value> = response.get(0).unwrap();
        let version: String = response.get(1).unwrap();

        assert_eq!(users[0]["name"], "user@example.com");
        assert_eq!(version, "5.7.22334.11");
        assert!(response.get::<Value>(2).is_err());
    }

    #[test]
    fn test_response_length_mismatch_is_decode_error() {
        assert!(matches!(
            MultiCallResponse::from_result(json!(["only one"]), 2),
            Err(Error::Decode(_))
        ));
        assert!(matches!(
            MultiCallResponse::from_result(json!({"not": "array"}), 1),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_typed_get_wrong_type() {
        let response = MultiCallResponse::from_result(json!(["text"]), 1).unwrap();
        assert!(matches!(response.get::<u64>(0), Err(Error::Decode(_))));
    }
}
