use super::{ModelLoadError, Prediction, PredictionError, Predictor};
use crate::core::models::sequence::Sequence;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const SEQUENCE_COLUMN: &str = "sequence";
const MIC_PREFIX: &str = "mic:";
const TOXICITY_PREFIX: &str = "tox:";

enum Column {
    Mic(usize),
    Toxicity(usize),
}

/// Replays precomputed predictions from a CSV table.
///
/// Expected header: `sequence,mic:<species>...,tox:<assay>...`. Sequences not
/// present in the table fail with [`PredictionError::ModelFailure`].
#[derive(Debug, Clone, Default)]
pub struct TablePredictor {
    species: Vec<String>,
    assays: Vec<String>,
    rows: HashMap<Sequence, Prediction>,
}

impl TablePredictor {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let file = std::fs::File::open(path).map_err(|e| ModelLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let table = Self::from_reader(file).map_err(|e| match e {
            ModelLoadError::Csv { source, .. } => ModelLoadError::Csv {
                path: path.to_string_lossy().to_string(),
                source,
            },
            other => other,
        })?;
        debug!(
            path = %path.display(),
            rows = table.rows.len(),
            "Loaded prediction lookup table."
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelLoadError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let csv_err = |source: csv::Error| ModelLoadError::Csv {
            path: "<reader>".to_string(),
            source,
        };

        let headers = reader.headers().map_err(csv_err)?.clone();
        let mut columns = Vec::with_capacity(headers.len());
        let mut species = Vec::new();
        let mut assays = Vec::new();

        match headers.get(0) {
            Some(first) if first.eq_ignore_ascii_case(SEQUENCE_COLUMN) => {}
            _ => {
                return Err(ModelLoadError::InvalidHeader(format!(
                    "first column must be '{}'",
                    SEQUENCE_COLUMN
                )));
            }
        }

        for name in headers.iter().skip(1) {
            if let Some(id) = name.strip_prefix(MIC_PREFIX) {
                columns.push(Column::Mic(species.len()));
                species.push(id.to_string());
            } else if let Some(id) = name.strip_prefix(TOXICITY_PREFIX) {
                columns.push(Column::Toxicity(assays.len()));
                assays.push(id.to_string());
            } else {
                return Err(ModelLoadError::InvalidHeader(format!(
                    "column '{}' must start with '{}' or '{}'",
                    name, MIC_PREFIX, TOXICITY_PREFIX
                )));
            }
        }
        if species.is_empty() {
            return Err(ModelLoadError::InvalidHeader(
                "at least one 'mic:<species>' column is required".to_string(),
            ));
        }

        let mut rows = HashMap::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let invalid = |message: String| ModelLoadError::InvalidRecord { line, message };

            let sequence = Sequence::parse(record.get(0).unwrap_or_default())
                .map_err(|e| invalid(e.to_string()))?;

            let mut prediction = Prediction::default();
            for (column, field) in columns.iter().zip(record.iter().skip(1)) {
                let value: f64 = field
                    .parse()
                    .map_err(|_| invalid(format!("'{}' is not a number", field)))?;
                match *column {
                    Column::Mic(i) => prediction.mic.insert(species[i].clone(), value),
                    Column::Toxicity(i) => prediction.toxicity.insert(assays[i].clone(), value),
                }
            }

            if rows.insert(sequence.clone(), prediction).is_some() {
                return Err(invalid(format!("duplicate sequence {}", sequence)));
            }
        }

        Ok(Self {
            species,
            assays,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Predictor for TablePredictor {
    fn species(&self) -> &[String] {
        &self.species
    }

    fn assays(&self) -> &[String] {
        &self.assays
    }

    fn predict(&self, sequence: &Sequence) -> Result<Prediction, PredictionError> {
        self.rows
            .get(sequence)
            .cloned()
            .ok_or_else(|| PredictionError::ModelFailure {
                sequence: sequence.to_string(),
                message: "sequence not present in lookup table".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TABLE: &str = "\
sequence,mic:C_albicans,mic:C_neoformans,tox:hemolysis
YCRTYWRYGRLRRRCYRRR,4.0,8.0,0.15
YCRTYWRYGRLKRRCYRRR,2.0,4.0,0.20
";

    #[test]
    fn table_is_parsed_into_species_and_assays() {
        let table = TablePredictor::from_reader(TABLE.as_bytes()).unwrap();
        assert_eq!(table.species(), ["C_albicans", "C_neoformans"]);
        assert_eq!(table.assays(), ["hemolysis"]);
        assert_eq!(table.len(), 2);

        let seq = Sequence::parse("YCRTYWRYGRLKRRCYRRR").unwrap();
        let prediction = table.predict(&seq).unwrap();
        assert_eq!(prediction.mic.get("C_neoformans"), Some(4.0));
        assert_eq!(prediction.toxicity.get("hemolysis"), Some(0.20));
    }

    #[test]
    fn unknown_sequence_is_a_model_failure() {
        let table = TablePredictor::from_reader(TABLE.as_bytes()).unwrap();
        let seq = Sequence::parse("KKKKKK").unwrap();
        assert!(matches!(
            table.predict(&seq),
            Err(PredictionError::ModelFailure { .. })
        ));
    }

    #[test]
    fn header_without_sequence_column_is_rejected() {
        let result = TablePredictor::from_reader("peptide,mic:C_albicans\nKKKKKK,1.0\n".as_bytes());
        assert!(matches!(result, Err(ModelLoadError::InvalidHeader(_))));
    }

    #[test]
    fn unprefixed_column_is_rejected() {
        let result =
            TablePredictor::from_reader("sequence,C_albicans\nKKKKKK,1.0\n".as_bytes());
        assert!(matches!(result, Err(ModelLoadError::InvalidHeader(_))));
    }

    #[test]
    fn malformed_sequence_row_reports_line() {
        let result = TablePredictor::from_reader(
            "sequence,mic:C_albicans\nKKXKKK,1.0\n".as_bytes(),
        );
        assert!(matches!(
            result,
            Err(ModelLoadError::InvalidRecord { line: 2, .. })
        ));
    }

    #[test]
    fn duplicate_rows_are_rejected() {
        let result = TablePredictor::from_reader(
            "sequence,mic:C_albicans\nKKKKKK,1.0\nkkkkkk,2.0\n".as_bytes(),
        );
        assert!(matches!(result, Err(ModelLoadError::InvalidRecord { .. })));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("predictions.csv");
        fs::write(&path, TABLE).unwrap();

        let table = TablePredictor::load(&path).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempdir().unwrap();
        let result = TablePredictor::load(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(ModelLoadError::Io { .. })));
    }
}
