//! Array engine operations
//!
//! Each method names one engine call and shapes its parameters. The
//! engine decides what the parameters mean.

use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

use super::{Backend, EngineError};
use crate::domain::{FilterAssignment, FilterList, OptionMap, Selection};

/// String-valued engine configuration (`sm.consolidation.mode` etc.)
pub type ContextConfig = BTreeMap<String, String>;

/// What a consolidation or vacuum pass works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsolidationMode {
    Fragments,
    FragmentMeta,
    ArrayMeta,
}

impl ConsolidationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsolidationMode::Fragments => "fragments",
            ConsolidationMode::FragmentMeta => "fragment_meta",
            ConsolidationMode::ArrayMeta => "array_meta",
        }
    }

    /// Engine config for a vacuum pass in this mode
    pub fn vacuum_config(&self) -> ContextConfig {
        let mut config = ContextConfig::new();
        config.insert("sm.vacuum.mode".to_string(), self.as_str().to_string());
        config
    }

    /// Engine config for a consolidation pass in this mode
    pub fn consolidation_config(&self, tuning: Option<&FragmentConsolidation>) -> ContextConfig {
        let mut config = ContextConfig::new();
        config.insert("sm.consolidation.mode".to_string(), self.as_str().to_string());

        if let Some(t) = tuning {
            let entries = [
                ("amplification", t.amplification.to_string()),
                ("buffer_size", t.buffer_size.to_string()),
                ("step_max_frags", t.step_max_frags.to_string()),
                ("step_min_frags", t.step_min_frags.to_string()),
                ("step_size_ratio", t.step_size_ratio.to_string()),
                ("steps", t.steps.to_string()),
            ];
            for (key, value) in entries {
                config.insert(format!("sm.consolidation.{}", key), value);
            }
        }

        config
    }
}

/// Tuning knobs for fragment consolidation
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentConsolidation {
    pub amplification: f64,
    pub buffer_size: u64,
    pub step_max_frags: u32,
    pub step_min_frags: u32,
    pub step_size_ratio: f64,
    pub steps: u32,
}

impl Default for FragmentConsolidation {
    fn default() -> Self {
        Self {
            amplification: 1.0,
            buffer_size: 50_000_000,
            step_max_frags: u32::MAX,
            step_min_frags: u32::MAX,
            step_size_ratio: 0.0,
            steps: u32::MAX,
        }
    }
}

/// Inclusive timestamp range of fragments to copy or delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentRange {
    pub start: i64,
    pub end: i64,
    pub verbose: bool,
    pub dry_run: bool,
}

impl FragmentRange {
    fn to_params(&self) -> serde_json::Value {
        json!({
            "timestamp_range": [self.start, self.end],
            "verbose": self.verbose,
            "dry_run": self.dry_run,
        })
    }
}

/// A read query against one array
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuerySpec {
    /// Attributes to return; `None` selects all
    pub attrs: Option<Vec<String>>,

    /// Dimensions to return, one selection each
    pub dims: Vec<String>,

    pub selection: Vec<Selection>,

    /// Open the array at this UNIX timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Keyword arguments for CSV ingestion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvIngestion {
    pub kwargs: OptionMap,
    pub attr_filters: Option<FilterAssignment>,
    pub dim_filters: Option<FilterAssignment>,
    pub coords_filters: Option<FilterList>,
}

impl CsvIngestion {
    /// Merges the generic options with the typed filter options
    pub fn to_kwargs(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut kwargs: serde_json::Map<String, serde_json::Value> = self
            .kwargs
            .iter()
            .map(|(name, value)| (name.clone(), json!(value)))
            .collect();

        if let Some(filters) = &self.attr_filters {
            kwargs.insert("attr_filters".to_string(), json!(filters));
        }
        if let Some(filters) = &self.dim_filters {
            kwargs.insert("dim_filters".to_string(), json!(filters));
        }
        if let Some(filters) = &self.coords_filters {
            kwargs.insert("coords_filters".to_string(), json!(filters));
        }

        kwargs
    }
}

/// Operations on arrays, implemented for every [`Backend`]
pub trait ArrayEngine: Backend {
    /// Ingests a delimited file into a new or existing array
    fn from_csv(
        &self,
        csv_file: &str,
        uri: &str,
        ingestion: &CsvIngestion,
    ) -> Result<serde_json::Value, EngineError> {
        self.call(
            "from_csv",
            json!({
                "uri": uri,
                "csv_file": csv_file,
                "kwargs": ingestion.to_kwargs(),
            }),
        )
    }

    /// Default engine configuration parameters and values
    fn config(&self) -> Result<serde_json::Value, EngineError> {
        self.call("config", json!({}))
    }

    fn schema(&self, uri: &str) -> Result<serde_json::Value, EngineError> {
        self.call("schema", json!({ "uri": uri }))
    }

    fn metadata(&self, uri: &str) -> Result<serde_json::Value, EngineError> {
        self.call("metadata", json!({ "uri": uri }))
    }

    fn nonempty_domain(&self, uri: &str) -> Result<serde_json::Value, EngineError> {
        self.call("nonempty_domain", json!({ "uri": uri }))
    }

    /// Names of the array's dimensions, in domain order
    fn dimension_names(&self, uri: &str) -> Result<Vec<String>, EngineError> {
        let data = self.call("dimension_names", json!({ "uri": uri }))?;
        serde_json::from_value(data).map_err(|e| EngineError::UnexpectedResponse {
            operation: "dimension_names".to_string(),
            reason: e.to_string(),
        })
    }

    fn array_fragments(
        &self,
        uri: &str,
        include_mbrs: bool,
    ) -> Result<serde_json::Value, EngineError> {
        self.call(
            "array_fragments",
            json!({ "uri": uri, "include_mbrs": include_mbrs }),
        )
    }

    fn query(&self, uri: &str, spec: &QuerySpec) -> Result<serde_json::Value, EngineError> {
        self.call("query", json!({ "uri": uri, "query": spec }))
    }

    fn consolidate(
        &self,
        uri: &str,
        config: &ContextConfig,
    ) -> Result<serde_json::Value, EngineError> {
        self.call("consolidate", json!({ "uri": uri, "config": config }))
    }

    fn vacuum(&self, uri: &str, config: &ContextConfig) -> Result<serde_json::Value, EngineError> {
        self.call("vacuum", json!({ "uri": uri, "config": config }))
    }

    /// Copies a range of fragments from `src` into a new or existing `dst`
    fn create_array_from_fragments(
        &self,
        src: &str,
        dst: &str,
        range: &FragmentRange,
    ) -> Result<serde_json::Value, EngineError> {
        let mut params = range.to_params();
        params["src_uri"] = json!(src);
        params["dst_uri"] = json!(dst);
        self.call("create_array_from_fragments", params)
    }

    fn delete_fragments(
        &self,
        uri: &str,
        range: &FragmentRange,
    ) -> Result<serde_json::Value, EngineError> {
        let mut params = range.to_params();
        params["uri"] = json!(uri);
        self.call("delete_fragments", params)
    }

    /// Version of the bridge's array library bindings
    fn version(&self) -> Result<serde_json::Value, EngineError> {
        self.call("version", json!({}))
    }

    /// Version of the embedded native library
    fn embedded_version(&self) -> Result<serde_json::Value, EngineError> {
        self.call("embedded_version", json!({}))
    }
}

impl<B: Backend + ?Sized> ArrayEngine for B {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{parse_filter_assignment, parse_kwargs};
    use crate::engine::{EngineRequest, EngineResponse};
    use std::cell::RefCell;

    /// Records requests and answers with canned data
    struct Recorder {
        requests: RefCell<Vec<EngineRequest>>,
        reply: serde_json::Value,
    }

    impl Recorder {
        fn new(reply: serde_json::Value) -> Self {
            Self {
                requests: RefCell::new(Vec::new()),
                reply,
            }
        }

        fn last(&self) -> EngineRequest {
            self.requests.borrow().last().cloned().unwrap()
        }
    }

    impl Backend for Recorder {
        fn execute(&self, request: &EngineRequest) -> Result<EngineResponse, EngineError> {
            self.requests.borrow_mut().push(request.clone());
            Ok(EngineResponse::success(self.reply.clone()))
        }

        fn describe(&self) -> String {
            "recorder".to_string()
        }
    }

    #[test]
    fn consolidation_config_defaults() {
        let config = ConsolidationMode::Fragments
            .consolidation_config(Some(&FragmentConsolidation::default()));

        assert_eq!(config["sm.consolidation.mode"], "fragments");
        assert_eq!(config["sm.consolidation.amplification"], "1");
        assert_eq!(config["sm.consolidation.buffer_size"], "50000000");
        assert_eq!(config["sm.consolidation.steps"], "4294967295");
        assert_eq!(config.len(), 7);
    }

    #[test]
    fn metadata_modes_only_set_the_mode() {
        let config = ConsolidationMode::ArrayMeta.consolidation_config(None);
        assert_eq!(config.len(), 1);
        assert_eq!(config["sm.consolidation.mode"], "array_meta");

        let vacuum = ConsolidationMode::FragmentMeta.vacuum_config();
        assert_eq!(vacuum["sm.vacuum.mode"], "fragment_meta");
    }

    #[test]
    fn from_csv_merges_filters_into_kwargs() {
        let engine = Recorder::new(serde_json::Value::Null);
        let ingestion = CsvIngestion {
            kwargs: parse_kwargs(["--sparse", "True", "--tile", "__tiledb_rows:2"]).unwrap(),
            attr_filters: Some(parse_filter_assignment("GzipFilter=9").unwrap()),
            ..Default::default()
        };

        engine.from_csv("in.csv", "out.tdb", &ingestion).unwrap();

        let request = engine.last();
        assert_eq!(request.operation, "from_csv");
        assert_eq!(
            request.params,
            json!({
                "uri": "out.tdb",
                "csv_file": "in.csv",
                "kwargs": {
                    "sparse": true,
                    "tile": {"__tiledb_rows": 2},
                    "attr_filters": [{"name": "GzipFilter", "level": 9}],
                },
            })
        );
    }

    #[test]
    fn fragment_range_params() {
        let engine = Recorder::new(serde_json::Value::Null);
        let range = FragmentRange {
            start: 2,
            end: 3,
            verbose: true,
            dry_run: false,
        };

        engine.delete_fragments("arr", &range).unwrap();
        assert_eq!(
            engine.last().params,
            json!({"uri": "arr", "timestamp_range": [2, 3], "verbose": true, "dry_run": false})
        );

        engine.create_array_from_fragments("a", "b", &range).unwrap();
        assert_eq!(engine.last().operation, "create_array_from_fragments");
        assert_eq!(engine.last().params["dst_uri"], "b");
    }

    #[test]
    fn dimension_names_are_decoded() {
        let engine = Recorder::new(json!(["rows", "cols"]));
        assert_eq!(engine.dimension_names("arr").unwrap(), vec!["rows", "cols"]);

        let engine = Recorder::new(json!({"not": "a list"}));
        assert!(matches!(
            engine.dimension_names("arr"),
            Err(EngineError::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn works_through_trait_objects() {
        let engine: Box<dyn Backend> = Box::new(Recorder::new(json!("ArraySchema(...)")));
        assert_eq!(engine.schema("arr").unwrap(), json!("ArraySchema(...)"));
    }
}
