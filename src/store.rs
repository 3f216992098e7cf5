use std::fs;
use std::io::{self, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;

use crate::domain::{DatasetKind, JsonStyle};
use crate::error::SampleError;
use crate::formatter;

/// Data-root anchored view of the dataset files.
#[derive(Debug, Clone)]
pub struct Store {
    data_root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, SampleError> {
        let cwd = std::env::current_dir().map_err(|err| SampleError::InputRead {
            path: Utf8PathBuf::from("."),
            message: err.to_string(),
        })?;
        let data_root =
            Utf8PathBuf::from_path_buf(cwd).map_err(|path| SampleError::InputRead {
                path: Utf8PathBuf::from(path.to_string_lossy().into_owned()),
                message: "non-utf8 working directory".to_string(),
            })?;
        Ok(Self { data_root })
    }

    pub fn new_with_root(data_root: Utf8PathBuf) -> Self {
        Self { data_root }
    }

    pub fn data_root(&self) -> &Utf8Path {
        &self.data_root
    }

    /// Relative paths land under the data root; absolute paths are kept.
    pub fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        self.data_root.join(path)
    }

    pub fn input_path(&self, kind: DatasetKind) -> Utf8PathBuf {
        self.resolve(Utf8Path::new(kind.default_input()))
    }

    pub fn output_path(&self, kind: DatasetKind) -> Utf8PathBuf {
        self.resolve(Utf8Path::new(kind.default_output()))
    }

    /// Reads and parses a whole JSON document.
    pub fn read_document(path: &Utf8Path) -> Result<Value, SampleError> {
        let content = fs::read(path.as_std_path()).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => SampleError::MissingInput(path.to_owned()),
            _ => SampleError::InputRead {
                path: path.to_owned(),
                message: err.to_string(),
            },
        })?;
        serde_json::from_slice(&content).map_err(|err| SampleError::MalformedJson {
            path: path.to_owned(),
            message: err.to_string(),
        })
    }

    /// Writes `value` in place, truncating any existing file.
    ///
    /// The parent directory must already exist. A failure part way through
    /// leaves a partial file behind.
    pub fn write_document(
        path: &Utf8Path,
        value: &Value,
        style: JsonStyle,
    ) -> Result<(), SampleError> {
        let write_error = |message: String| SampleError::OutputWrite {
            path: path.to_owned(),
            message,
        };
        let file =
            fs::File::create(path.as_std_path()).map_err(|err| write_error(err.to_string()))?;
        let mut writer = BufWriter::new(file);
        formatter::to_writer(&mut writer, value, style)
            .map_err(|err| write_error(err.to_string()))?;
        writer.flush().map_err(|err| write_error(err.to_string()))?;
        Ok(())
    }
}
