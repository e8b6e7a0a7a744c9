//! TileDB Cloud operations

use serde_json::json;

use super::{Backend, EngineError};

/// How `cloud login` authenticates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Token(String),
    Password { username: String, password: String },
}

/// Parameters for `cloud login`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginParams {
    pub credential: Credential,
    pub host: Option<String>,
    pub verify_ssl: bool,
    pub no_session: bool,
    pub threads: u32,
}

impl LoginParams {
    fn to_params(&self) -> serde_json::Value {
        let mut params = json!({
            "host": self.host,
            "verify_ssl": self.verify_ssl,
            "no_session": self.no_session,
            "threads": self.threads,
        });

        match &self.credential {
            Credential::Token(token) => params["token"] = json!(token),
            Credential::Password { username, password } => {
                params["username"] = json!(username);
                params["password"] = json!(password);
            }
        }

        params
    }
}

/// Filters and pagination for array listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrayListing {
    pub namespace: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Access granted when sharing an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Permission {
    Read,
    Write,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
        }
    }
}

/// TileDB Cloud operations, implemented for every [`Backend`]
pub trait CloudClient: Backend {
    fn login(&self, params: &LoginParams) -> Result<serde_json::Value, EngineError> {
        self.call("cloud.login", params.to_params())
    }

    fn array_activity(&self, uri: &str) -> Result<serde_json::Value, EngineError> {
        self.call("cloud.array_activity", json!({ "uri": uri }))
    }

    fn list_arrays(&self, listing: &ArrayListing) -> Result<serde_json::Value, EngineError> {
        self.call(
            "cloud.list_arrays",
            json!({
                "namespace": listing.namespace,
                "search": listing.search,
                "page": listing.page,
                "per_page": listing.per_page,
            }),
        )
    }

    fn organizations(&self) -> Result<serde_json::Value, EngineError> {
        self.call("cloud.organizations", json!({}))
    }

    fn user_profile(&self) -> Result<serde_json::Value, EngineError> {
        self.call("cloud.user_profile", json!({}))
    }

    /// A task by id, or the most recent task when `id` is `None`
    fn task(&self, id: Option<&str>) -> Result<serde_json::Value, EngineError> {
        self.call("cloud.task", json!({ "id": id }))
    }

    fn share_array(
        &self,
        uri: &str,
        namespace: &str,
        permissions: &[Permission],
    ) -> Result<serde_json::Value, EngineError> {
        let permissions: Vec<&str> = permissions.iter().map(Permission::as_str).collect();
        self.call(
            "cloud.share_array",
            json!({ "uri": uri, "namespace": namespace, "permissions": permissions }),
        )
    }

    fn unshare_array(&self, uri: &str, namespace: &str) -> Result<serde_json::Value, EngineError> {
        self.call(
            "cloud.unshare_array",
            json!({ "uri": uri, "namespace": namespace }),
        )
    }
}

impl<B: Backend + ?Sized> CloudClient for B {}
