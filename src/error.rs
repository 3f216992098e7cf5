use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SampleError {
    #[error("unknown dataset: {0}")]
    #[diagnostic(help(
        "expected one of: cell-cluster-mapping, cell-gene-expression, gene-cell-expression, umap, umap-clusters"
    ))]
    UnknownDataset(String),

    #[error("input file not found: {0}")]
    MissingInput(Utf8PathBuf),

    #[error("failed to read {path}: {message}")]
    InputRead { path: Utf8PathBuf, message: String },

    #[error("malformed JSON in {path}: {message}")]
    MalformedJson { path: Utf8PathBuf, message: String },

    #[error("expected a JSON object at the root of {path}, found {found}")]
    RootNotObject { path: Utf8PathBuf, found: String },

    #[error("expected a JSON array at the root of {path}, found {found}")]
    RootNotArray { path: Utf8PathBuf, found: String },

    #[error("key is not an integer: {0:?}")]
    NonIntegerKey(String),

    #[error("record {index} of {key:?} does not start with a number: {found}")]
    NonIntegerRecordHead {
        key: String,
        index: usize,
        found: String,
    },

    #[error("unexpected record shape under {key:?}: {message}")]
    RecordShape { key: String, message: String },

    #[error("failed to write {path}: {message}")]
    OutputWrite { path: Utf8PathBuf, message: String },

    #[error("missing config file kira-ds.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),
}

impl SampleError {
    /// Short JSON type name used in shape errors.
    pub fn describe(value: &serde_json::Value) -> String {
        let kind = match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "boolean",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Array(_) => "array",
            serde_json::Value::Object(_) => "object",
        };
        kind.to_string()
    }
}
