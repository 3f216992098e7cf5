//! Uniform 1-in-10 filtering of JSON datasets.
//!
//! Every rule funnels through [`sample_mapping`], which walks the top-level
//! entries once and lets a selection closure decide whether (and with what
//! value) each entry survives.

use std::collections::HashMap;

use camino::Utf8Path;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::{CellId, KeyRule, SAMPLING_RATE, bool_is_sampled, number_is_sampled};
use crate::error::SampleError;

/// Point field used to group the cluster table.
pub const CLUSTER_FIELD: &str = "Cluster";

/// Clusters at or below this size are kept whole.
pub const MIN_CLUSTER_SIZE: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SampleStats {
    pub entries_in: usize,
    pub entries_out: usize,
    pub records_in: Option<usize>,
    pub records_out: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sampled<T> {
    pub data: T,
    pub stats: SampleStats,
}

/// Keeps the entries for which `select` returns a value, in input order.
pub fn sample_mapping<F>(
    data: Map<String, Value>,
    mut select: F,
) -> Result<Map<String, Value>, SampleError>
where
    F: FnMut(&str, Value) -> Result<Option<Value>, SampleError>,
{
    let mut retained = Map::new();
    for (key, value) in data {
        if let Some(value) = select(&key, value)? {
            retained.insert(key, value);
        }
    }
    Ok(retained)
}

/// Mapping keyed by cell id; values pass through untouched.
pub fn sample_direct(
    data: Map<String, Value>,
) -> Result<Sampled<Map<String, Value>>, SampleError> {
    let entries_in = data.len();
    let retained = sample_mapping(data, |key, value| {
        let id: CellId = key.parse()?;
        Ok(id.is_sampled().then_some(value))
    })?;
    Ok(Sampled {
        stats: SampleStats {
            entries_in,
            entries_out: retained.len(),
            records_in: None,
            records_out: None,
        },
        data: retained,
    })
}

/// Mapping of key to record lists, each record led by a cell id.
///
/// Records are filtered independently. A key whose records are all dropped
/// disappears from the output.
pub fn sample_indexed(
    data: Map<String, Value>,
) -> Result<Sampled<Map<String, Value>>, SampleError> {
    let entries_in = data.len();
    let mut records_in = 0;
    let mut records_out = 0;
    let retained = sample_mapping(data, |key, value| {
        let records = match value {
            Value::Array(records) => records,
            other => {
                return Err(SampleError::RecordShape {
                    key: key.to_string(),
                    message: format!(
                        "expected an array of records, found {}",
                        SampleError::describe(&other)
                    ),
                });
            }
        };
        records_in += records.len();

        let mut kept = Vec::new();
        for (index, record) in records.into_iter().enumerate() {
            if record_is_sampled(key, index, &record)? {
                kept.push(record);
            }
        }
        records_out += kept.len();
        Ok((!kept.is_empty()).then_some(Value::Array(kept)))
    })?;
    Ok(Sampled {
        stats: SampleStats {
            entries_in,
            entries_out: retained.len(),
            records_in: Some(records_in),
            records_out: Some(records_out),
        },
        data: retained,
    })
}

fn record_is_sampled(key: &str, index: usize, record: &Value) -> Result<bool, SampleError> {
    let Value::Array(items) = record else {
        return Err(SampleError::RecordShape {
            key: key.to_string(),
            message: format!(
                "record {index} is {}, expected an array",
                SampleError::describe(record)
            ),
        });
    };
    match items.first() {
        Some(Value::Number(number)) => Ok(number_is_sampled(number)),
        Some(Value::Bool(flag)) => Ok(bool_is_sampled(*flag)),
        Some(other) => Err(SampleError::NonIntegerRecordHead {
            key: key.to_string(),
            index,
            found: SampleError::describe(other),
        }),
        None => Err(SampleError::RecordShape {
            key: key.to_string(),
            message: format!("record {index} is empty"),
        }),
    }
}

/// Array of points thinned per cluster.
///
/// Points are grouped by the text of their `Cluster` field. Groups are
/// visited the way a JavaScript object lists its keys: labels that are
/// canonical array indices first in ascending order, then every other label
/// in order of first appearance. Groups larger than [`MIN_CLUSTER_SIZE`] keep
/// every [`SAMPLING_RATE`]th point starting with the first; smaller groups are
/// kept whole. The output lists the kept points group by group.
pub fn sample_clusters(points: Vec<Value>) -> Result<Sampled<Vec<Value>>, SampleError> {
    let entries_in = points.len();
    let mut group_index = HashMap::<String, usize>::new();
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();

    for (index, point) in points.iter().enumerate() {
        let label = cluster_label(index, point)?;
        let slot = *group_index.entry(label.clone()).or_insert_with(|| {
            groups.push((label, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(index);
    }

    let mut ordered: Vec<&(String, Vec<usize>)> = groups.iter().collect();
    // Stable: non-index labels keep their first-appearance order.
    ordered.sort_by_key(|(label, _)| match array_index(label) {
        Some(position) => (false, position),
        None => (true, 0),
    });

    let mut slots: Vec<Option<Value>> = points.into_iter().map(Some).collect();
    let mut kept = Vec::new();
    for (_, members) in ordered {
        let step = if members.len() > MIN_CLUSTER_SIZE {
            SAMPLING_RATE as usize
        } else {
            1
        };
        for &index in members.iter().step_by(step) {
            if let Some(point) = slots[index].take() {
                kept.push(point);
            }
        }
    }

    Ok(Sampled {
        stats: SampleStats {
            entries_in,
            entries_out: kept.len(),
            records_in: None,
            records_out: None,
        },
        data: kept,
    })
}

/// `Some(n)` when `label` is a canonical array index (`0`, `1`, ... below 2^32 - 1).
fn array_index(label: &str) -> Option<u32> {
    let canonical = !label.is_empty()
        && label.bytes().all(|byte| byte.is_ascii_digit())
        && (label == "0" || !label.starts_with('0'));
    if !canonical {
        return None;
    }
    label.parse::<u32>().ok().filter(|&position| position < u32::MAX)
}

fn cluster_label(index: usize, point: &Value) -> Result<String, SampleError> {
    let shape_error = |message: String| SampleError::RecordShape {
        key: index.to_string(),
        message,
    };
    let Value::Object(fields) = point else {
        return Err(shape_error(format!(
            "point is {}, expected an object",
            SampleError::describe(point)
        )));
    };
    match fields.get(CLUSTER_FIELD) {
        Some(Value::String(label)) => Ok(label.clone()),
        Some(Value::Number(number)) => Ok(number_label(number)),
        Some(other) => Ok(other.to_string()),
        None => Err(shape_error(format!("point has no {CLUSTER_FIELD:?} field"))),
    }
}

/// Integral numbers render without a fraction, so `3` and `3.0` share a group.
fn number_label(number: &serde_json::Number) -> String {
    if let Some(value) = number.as_u64() {
        return value.to_string();
    }
    if let Some(value) = number.as_i64() {
        return value.to_string();
    }
    match number.as_f64() {
        Some(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", value as i64)
        }
        _ => number.to_string(),
    }
}

/// Applies `rule` to a parsed document, checking the root shape first.
pub fn sample_document(
    rule: KeyRule,
    document: Value,
    source: &Utf8Path,
) -> Result<Sampled<Value>, SampleError> {
    match (rule, document) {
        (KeyRule::Direct, Value::Object(map)) => {
            sample_direct(map).map(|sampled| sampled.map(Value::Object))
        }
        (KeyRule::Indexed, Value::Object(map)) => {
            sample_indexed(map).map(|sampled| sampled.map(Value::Object))
        }
        (KeyRule::ClusterStratified, Value::Array(points)) => {
            sample_clusters(points).map(|sampled| sampled.map(Value::Array))
        }
        (KeyRule::ClusterStratified, other) => Err(SampleError::RootNotArray {
            path: source.to_owned(),
            found: SampleError::describe(&other),
        }),
        (_, other) => Err(SampleError::RootNotObject {
            path: source.to_owned(),
            found: SampleError::describe(&other),
        }),
    }
}

impl<T> Sampled<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sampled<U> {
        Sampled {
            data: f(self.data),
            stats: self.stats,
        }
    }
}
