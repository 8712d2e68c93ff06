//! GraphQL executor.
//!
//! Queries are `POST`ed as `{query, variables}` through a [`Requester`], so
//! they run through the same hook chain as REST calls.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::{Endpoint, Error, Requester, Result, from_json};

/// Enterprise REST prefix, served next to `/api/graphql`.
const ENTERPRISE_REST_SUFFIX: &str = "/api/v3";

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<Value>,
}

/// GraphQL executor bound to a [`Requester`].
#[derive(Debug, Clone, Default)]
pub struct Graphql {
    requester: Requester,
}

impl Graphql {
    /// An executor sending through `requester` (and its hook chain).
    #[must_use]
    pub fn with_custom_request(requester: Requester) -> Self {
        Self { requester }
    }

    /// A new executor whose request defaults are merged with `params`.
    pub fn defaults(&self, params: Value) -> Result<Self> {
        Ok(Self {
            requester: self.requester.defaults(params)?,
        })
    }

    /// The endpoint a query is sent to.
    pub fn endpoint(&self, query: &str, variables: Value) -> Result<Endpoint> {
        let mut params = json!({ "query": query });
        if !variables.is_null() {
            params["variables"] = variables;
        }

        let mut endpoint = self.requester.endpoint("POST /graphql", params)?;
        let base_url = endpoint.base_url.trim_end_matches('/');
        if let Some(prefix) = base_url.strip_suffix(ENTERPRISE_REST_SUFFIX) {
            endpoint.url = format!("{prefix}/api/graphql");
        }
        Ok(endpoint)
    }

    /// Run a query and return its `data`.
    ///
    /// # Errors
    ///
    /// A non-empty `errors` array becomes [`Error::GraphQl`], carrying the
    /// partial `data` when present.
    pub async fn query(&self, query: &str, variables: Value) -> Result<Value> {
        let endpoint = self.endpoint(query, variables)?;
        let response = self.requester.send(endpoint).await?;
        let GraphqlResponse { data, errors } = from_json(response.body())?;

        if !errors.is_empty() {
            return Err(Error::graphql(errors, data));
        }
        Ok(data.unwrap_or(Value::Null))
    }

    /// Run a query and decode its `data`.
    pub async fn query_as<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let data = self.query(query, variables).await?;
        serde_json::from_value(data).map_err(Error::from)
    }
}
