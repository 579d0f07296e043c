//! Sample records used to smoke-test formula definitions

use anyhow::{bail, Context, Result};
use crm_formula::{FieldValue, Record};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Sample record per entity type, with an optional record used for any
/// entity that has no sample of its own.
#[derive(Debug, Clone, Default)]
pub struct Samples {
    by_entity: BTreeMap<String, Record>,
    fallback: Option<Record>,
}

impl Samples {
    /// Fixed records for the four CRM entities
    pub fn builtin() -> Self {
        let mut by_entity = BTreeMap::new();
        by_entity.insert(
            "transaction".to_string(),
            record(&[
                ("amount", 450000.0),
                ("salePrice", 450000.0),
                ("commissionPct", 3.0),
                ("referralFeePct", 25.0),
                ("closingCosts", 8500.0),
                ("closeDate", 45292.0),
                ("isDualAgency", 0.0),
            ]),
        );
        by_entity.insert(
            "agent".to_string(),
            record(&[
                ("splitPct", 70.0),
                ("capAmount", 20000.0),
                ("ytdGci", 85000.0),
                ("ytdCompanyDollar", 18500.0),
                ("transactionCount", 12.0),
            ]),
        );
        by_entity.insert(
            "listing".to_string(),
            record(&[
                ("listPrice", 525000.0),
                ("originalListPrice", 549000.0),
                ("squareFeet", 2400.0),
                ("daysOnMarket", 21.0),
                ("commissionPct", 2.5),
            ]),
        );
        by_entity.insert(
            "commissionPayment".to_string(),
            record(&[
                ("amount", 13500.0),
                ("paidAmount", 13500.0),
                ("balanceDue", 0.0),
                ("splitPct", 70.0),
            ]),
        );
        Self {
            by_entity,
            fallback: None,
        }
    }

    /// Load samples from a `.csv` file (first data row, for every entity) or
    /// a JSON object keyed by entity.
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open '{}'", path.display()))?;
        let is_csv = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"));

        if is_csv {
            Self::from_csv(file).with_context(|| format!("Failed to read '{}'", path.display()))
        } else {
            Self::from_json(file).with_context(|| format!("Failed to parse '{}'", path.display()))
        }
    }

    pub fn from_json<R: Read>(reader: R) -> Result<Self> {
        let by_entity: BTreeMap<String, Record> = serde_json::from_reader(reader)?;
        Ok(Self {
            by_entity,
            fallback: None,
        })
    }

    /// Header row names the fields; the first record supplies their values as text.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let row = match csv_reader.records().next() {
            Some(row) => row?,
            None => bail!("CSV has a header row but no data"),
        };

        let fallback = headers
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name, FieldValue::Text(value.to_string())))
            .collect();

        Ok(Self {
            by_entity: BTreeMap::new(),
            fallback: Some(fallback),
        })
    }

    pub fn record_for(&self, entity: &str) -> Option<&Record> {
        self.by_entity.get(entity).or(self.fallback.as_ref())
    }
}

fn record(fields: &[(&str, f64)]) -> Record {
    fields.iter().map(|&(name, value)| (name, value)).collect()
}
