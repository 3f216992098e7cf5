use std::fs;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::DatasetKind;
use crate::error::SampleError;

pub const CONFIG_FILE: &str = "kira-ds.json";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub data_root: Option<String>,
    #[serde(default)]
    pub datasets: Vec<DatasetEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DatasetEntry {
    Shorthand(String),
    Detailed(DatasetEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DatasetEntryObject {
    pub dataset: String,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

/// One dataset to sample. Paths are resolved against the data root at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRequest {
    pub dataset: DatasetKind,
    pub input: Utf8PathBuf,
    pub output: Utf8PathBuf,
}

impl SampleRequest {
    pub fn builtin(dataset: DatasetKind) -> Self {
        Self {
            dataset,
            input: Utf8PathBuf::from(dataset.default_input()),
            output: Utf8PathBuf::from(dataset.default_output()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub data_root: Option<Utf8PathBuf>,
    pub requests: Vec<SampleRequest>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, SampleError> {
        let config_path = match path {
            Some(path) => Utf8PathBuf::from(path),
            None => Utf8PathBuf::from(CONFIG_FILE),
        };

        if path.is_none() && !config_path.as_std_path().exists() {
            return Err(SampleError::MissingConfig);
        }

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| SampleError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| SampleError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, SampleError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let requests = config
            .datasets
            .into_iter()
            .map(|entry| match entry {
                DatasetEntry::Shorthand(value) => Ok(SampleRequest::builtin(value.parse()?)),
                DatasetEntry::Detailed(obj) => {
                    let builtin = SampleRequest::builtin(obj.dataset.parse()?);
                    Ok(SampleRequest {
                        input: obj.input.map(Utf8PathBuf::from).unwrap_or(builtin.input),
                        output: obj.output.map(Utf8PathBuf::from).unwrap_or(builtin.output),
                        dataset: builtin.dataset,
                    })
                }
            })
            .collect::<Result<Vec<_>, SampleError>>()?;

        Ok(ResolvedConfig {
            schema_version,
            data_root: config.data_root.map(Utf8PathBuf::from),
            requests,
        })
    }
}
