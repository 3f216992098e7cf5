use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::error::SampleError;

/// Keep one identifier in every `SAMPLING_RATE`.
pub const SAMPLING_RATE: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetKind {
    CellClusterMapping,
    CellGeneExpression,
    GeneCellExpression,
    Umap,
    UmapClusters,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 5] = [
        DatasetKind::CellClusterMapping,
        DatasetKind::CellGeneExpression,
        DatasetKind::GeneCellExpression,
        DatasetKind::Umap,
        DatasetKind::UmapClusters,
    ];

    /// The mapping datasets that write a `*Combined.json` reduction.
    pub const COMBINED: [DatasetKind; 4] = [
        DatasetKind::CellClusterMapping,
        DatasetKind::CellGeneExpression,
        DatasetKind::GeneCellExpression,
        DatasetKind::Umap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::CellClusterMapping => "cell-cluster-mapping",
            DatasetKind::CellGeneExpression => "cell-gene-expression",
            DatasetKind::GeneCellExpression => "gene-cell-expression",
            DatasetKind::Umap => "umap",
            DatasetKind::UmapClusters => "umap-clusters",
        }
    }

    pub fn rule(&self) -> KeyRule {
        match self {
            DatasetKind::CellClusterMapping
            | DatasetKind::CellGeneExpression
            | DatasetKind::Umap => KeyRule::Direct,
            DatasetKind::GeneCellExpression => KeyRule::Indexed,
            DatasetKind::UmapClusters => KeyRule::ClusterStratified,
        }
    }

    pub fn style(&self) -> JsonStyle {
        match self {
            DatasetKind::GeneCellExpression => JsonStyle::Compact,
            _ => JsonStyle::Spaced,
        }
    }

    /// Input path relative to the data root.
    pub fn default_input(&self) -> &'static str {
        match self {
            DatasetKind::CellClusterMapping => {
                "data/cell_cluster_mapping/cell_cluster_mapping_sampleAll.json"
            }
            DatasetKind::CellGeneExpression => {
                "data/cell_gene_expression/cell_gene_expression_All - Copy.json"
            }
            DatasetKind::GeneCellExpression => {
                "data/gene_cell_expression/gene_cell_expression_All.json"
            }
            DatasetKind::Umap => "data/umap/umap_All.json",
            DatasetKind::UmapClusters => "data/umap_cluster_data.json",
        }
    }

    /// Output path relative to the data root.
    pub fn default_output(&self) -> &'static str {
        match self {
            DatasetKind::CellClusterMapping => {
                "data/cell_cluster_mapping/cell_cluster_mapping_sampleCombined.json"
            }
            DatasetKind::CellGeneExpression => {
                "data/cell_gene_expression/cell_gene_expression_Combined.json"
            }
            DatasetKind::GeneCellExpression => {
                "data/gene_cell_expression/gene_cell_expression_Combined.json"
            }
            DatasetKind::Umap => "data/umap/umap_Combined.json",
            DatasetKind::UmapClusters => "data/umap_cluster_data_sampled.json",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = SampleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase().replace('_', "-");
        DatasetKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| SampleError::UnknownDataset(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyRule {
    /// The mapping key itself is the cell id.
    Direct,
    /// Each value is a list of records led by a cell id.
    Indexed,
    /// Root array of points, thinned per `Cluster` group.
    ClusterStratified,
}

impl fmt::Display for KeyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRule::Direct => write!(f, "direct"),
            KeyRule::Indexed => write!(f, "indexed"),
            KeyRule::ClusterStratified => write!(f, "cluster-stratified"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JsonStyle {
    /// `, ` and `: ` separators on a single line.
    Spaced,
    /// `,` and `:` with no whitespace.
    Compact,
}

impl fmt::Display for JsonStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonStyle::Spaced => write!(f, "spaced"),
            JsonStyle::Compact => write!(f, "compact"),
        }
    }
}

/// Integer cell identifier parsed from a mapping key.
///
/// Accepts surrounding whitespace, an optional sign, leading zeros and single
/// underscores between digits. Magnitude is unbounded; only the normalized
/// digit string is kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellId {
    negative: bool,
    digits: String,
}

impl CellId {
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// Absolute remainder modulo `rate`. Divisibility does not depend on sign.
    pub fn remainder(&self, rate: u64) -> u64 {
        self.digits.bytes().fold(0u64, |acc, byte| {
            (acc * 10 + u64::from(byte - b'0')) % rate
        })
    }

    pub fn is_sampled(&self) -> bool {
        self.remainder(SAMPLING_RATE) == 0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative && self.digits != "0" {
            write!(f, "-")?;
        }
        write!(f, "{}", self.digits)
    }
}

impl FromStr for CellId {
    type Err = SampleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || SampleError::NonIntegerKey(value.to_string());
        let trimmed = value.trim();
        let (negative, body) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let mut digits = String::with_capacity(body.len());
        let mut previous_underscore = true;
        for ch in body.chars() {
            match ch {
                '0'..='9' => {
                    digits.push(ch);
                    previous_underscore = false;
                }
                '_' if !previous_underscore => previous_underscore = true,
                _ => return Err(invalid()),
            }
        }
        if digits.is_empty() || previous_underscore {
            return Err(invalid());
        }

        let significant = digits.trim_start_matches('0');
        let digits = if significant.is_empty() {
            "0".to_string()
        } else {
            significant.to_string()
        };
        Ok(Self { negative, digits })
    }
}

/// Modulus test on a numeric record head. Integral floats pass like integers.
///
/// Integers wider than 64 bits keep their source spelling and are tested
/// digit by digit, never through a rounded float.
pub fn number_is_sampled(number: &Number) -> bool {
    if let Some(value) = number.as_u64() {
        return value % SAMPLING_RATE == 0;
    }
    if let Some(value) = number.as_i64() {
        return value.unsigned_abs() % SAMPLING_RATE == 0;
    }
    let text = number.to_string();
    if !text.contains(['.', 'e', 'E'])
        && let Ok(id) = text.parse::<CellId>()
    {
        return id.is_sampled();
    }
    number
        .as_f64()
        .map(|value| value % SAMPLING_RATE as f64 == 0.0)
        .unwrap_or(false)
}

/// Booleans count as 0 and 1 in the modulus test.
pub fn bool_is_sampled(flag: bool) -> bool {
    u64::from(flag) % SAMPLING_RATE == 0
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_cell_id_plain() {
        let id: CellId = "120".parse().unwrap();
        assert_eq!(id.digits(), "120");
        assert!(id.is_sampled());
    }

    #[test]
    fn parse_cell_id_normalizes() {
        let id: CellId = "  -0_0_1_0 ".parse().unwrap();
        assert!(id.is_negative());
        assert_eq!(id.to_string(), "-10");
        assert!(id.is_sampled());

        let zero: CellId = "-000".parse().unwrap();
        assert_eq!(zero.to_string(), "0");
        assert!(zero.is_sampled());
    }

    #[test]
    fn parse_cell_id_rejects_garbage() {
        for raw in ["", "-", "1.0", "1e3", "_10", "10_", "1__0", "0x10", "cell7", "+-1"] {
            let err = raw.parse::<CellId>().unwrap_err();
            assert_matches!(err, SampleError::NonIntegerKey(_), "{raw:?}");
        }
    }

    #[test]
    fn remainder_handles_wide_ids() {
        let id: CellId = "123456789012345678901234567890".parse().unwrap();
        assert_eq!(id.remainder(SAMPLING_RATE), 0);
        let id: CellId = "123456789012345678901234567893".parse().unwrap();
        assert_eq!(id.remainder(SAMPLING_RATE), 3);
        assert!(!id.is_sampled());
    }

    #[test]
    fn numbers_follow_modulus() {
        let sampled = |raw: &str| number_is_sampled(&raw.parse::<Number>().unwrap());
        assert!(sampled("0"));
        assert!(sampled("10"));
        assert!(sampled("-20"));
        assert!(sampled("30.0"));
        assert!(!sampled("7"));
        assert!(!sampled("-5"));
        assert!(!sampled("10.5"));
        assert!(sampled("-20.0"));
        assert!(sampled("100000000000000000000"));
        assert!(!sampled("100000000000000000001"));
        assert!(sampled("-123456789012345678901234567890"));
    }

    #[test]
    fn booleans_count_as_digits() {
        assert!(bool_is_sampled(false));
        assert!(!bool_is_sampled(true));
    }

    #[test]
    fn dataset_kind_names() {
        for kind in DatasetKind::ALL {
            assert_eq!(kind.as_str().parse::<DatasetKind>().unwrap(), kind);
        }
        assert_eq!(
            "gene_cell_expression".parse::<DatasetKind>().unwrap(),
            DatasetKind::GeneCellExpression
        );
        assert_matches!(
            "tsne".parse::<DatasetKind>(),
            Err(SampleError::UnknownDataset(_))
        );
    }

    #[test]
    fn only_gene_cell_is_compact() {
        for kind in DatasetKind::ALL {
            let expected = if kind == DatasetKind::GeneCellExpression {
                JsonStyle::Compact
            } else {
                JsonStyle::Spaced
            };
            assert_eq!(kind.style(), expected);
        }
    }
}
