use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LensError;
use crate::types::ColumnDescriptor;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_SOURCE: &str = "survey.csv";
pub const DEFAULT_EXPORT_NAME: &str = "respostas_filtradas.csv";

const TIMESTAMP: &str = "Carimbo de data/hora";
const NAME: &str = "1. Qual seu nome?";
const AGE: &str = "2. Qual sua idade?";
const RATING: &str = "3. Em uma escala de 1 a 5, como você avaliaria sua experiência na UBS? ( 1 = Muito ruim | 5 = Excelente )";
const EXPECTATIONS: &str = "4. O atendimento que você recebeu atendeu às suas expectativas?";
const SCHEDULE: &str = "5. Em uma escala de 1 a 5, como você avalia a experiência com o horário corrido?  ( 1 = Muito ruim | 5 = Excelente )";
const COMMENT: &str = "6. O que poderiamos melhorar? Resposta aberta:";

/// Dashboard configuration. Every field has a default matching the UBS
/// satisfaction survey export, so a TOML file only needs the overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Table columns in display order. Search looks at these only.
    pub columns: Vec<ColumnDescriptor>,
    pub page_size: usize,
    pub fields: Fields,
    pub expectations: ExpectationWords,
    /// Lower-case words that mark a top-rated comment as positive.
    pub positive_keywords: Vec<String>,
}

/// Record keys with a fixed role in the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Fields {
    /// Sorted by extracted date; source of the survey period.
    pub timestamp: String,
    pub name: String,
    pub age: String,
    /// Experience rating. Also the exact-match filter column.
    pub rating: String,
    pub expectations: String,
    pub schedule: String,
    pub comment: String,
}

/// Answers to the expectations question, compared lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExpectationWords {
    /// Exact match.
    pub yes: String,
    /// Substring match.
    pub partial: String,
    /// Exact match.
    pub no: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            columns: vec![
                ColumnDescriptor::new(TIMESTAMP, "Data"),
                ColumnDescriptor::new(NAME, "Nome"),
                ColumnDescriptor::new(AGE, "Idade"),
                ColumnDescriptor::new(RATING, "Nota Experiência UBS"),
                ColumnDescriptor::new(EXPECTATIONS, "Expectativas Atendidas"),
                ColumnDescriptor::new(SCHEDULE, "Nota Horário Corrido"),
                ColumnDescriptor::new(COMMENT, "Sugestão/Melhoria"),
            ],
            page_size: DEFAULT_PAGE_SIZE,
            fields: Fields::default(),
            expectations: ExpectationWords::default(),
            positive_keywords: ["ótimo", "excelente", "maravilhoso", "bom", "satisfeito"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl Default for Fields {
    fn default() -> Self {
        Self {
            timestamp: TIMESTAMP.into(),
            name: NAME.into(),
            age: AGE.into(),
            rating: RATING.into(),
            expectations: EXPECTATIONS.into(),
            schedule: SCHEDULE.into(),
            comment: COMMENT.into(),
        }
    }
}

impl Default for ExpectationWords {
    fn default() -> Self {
        Self {
            yes: "sim".into(),
            partial: "parcial".into(),
            no: "não".into(),
        }
    }
}

impl Config {
    /// Read a TOML config file. Missing keys fall back to the defaults.
    pub fn load(path: &Path) -> Result<Self, LensError> {
        let text = fs::read_to_string(path).map_err(|e| LensError::from_io(path, e))?;
        let config = Self::from_toml(&text).map_err(|reason| LensError::Config {
            path: path.to_path_buf(),
            reason,
        })?;
        debug!(path = %path.display(), columns = config.columns.len(), "loaded config");
        Ok(config)
    }

    pub(crate) fn from_toml(text: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(text).map_err(|e| e.message().to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 {
            return Err("page_size must be at least 1".into());
        }
        if self.columns.is_empty() {
            return Err("at least one column is required".into());
        }
        Ok(())
    }

    /// Resolve a `--sort` argument: a 0-based column index, or a column
    /// label compared case-insensitively.
    pub fn resolve_column(&self, spec: &str) -> Result<usize, LensError> {
        if let Ok(index) = spec.trim().parse::<usize>() {
            return Ok(index);
        }
        let wanted = spec.trim().to_lowercase();
        self.columns
            .iter()
            .position(|c| c.label.to_lowercase() == wanted)
            .ok_or_else(|| LensError::UnknownColumn {
                name: spec.to_string(),
            })
    }

    /// Index of the timestamp column among the display columns.
    #[must_use]
    pub fn date_column(&self) -> Option<usize> {
        self.columns.iter().position(|c| c.key == self.fields.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_survey_layout() {
        let c = Config::default();
        assert_eq!(c.columns.len(), 7);
        assert_eq!(c.page_size, 10);
        assert_eq!(c.date_column(), Some(0));
        assert_eq!(c.columns[3].key, c.fields.rating);
    }

    #[test]
    fn resolves_sort_columns_by_index_or_label() {
        let c = Config::default();
        assert_eq!(c.resolve_column("2").unwrap(), 2);
        assert_eq!(c.resolve_column("nome").unwrap(), 1);
        assert_eq!(c.resolve_column("Nota Horário Corrido").unwrap(), 5);
        assert!(matches!(
            c.resolve_column("Cidade"),
            Err(LensError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = Config::from_toml("page_size = 25\n[expectations]\nyes = \"yes\"\n").unwrap();
        assert_eq!(c.page_size, 25);
        assert_eq!(c.expectations.yes, "yes");
        assert_eq!(c.expectations.no, "não");
        assert_eq!(c.columns, Config::default().columns);
    }

    #[test]
    fn custom_columns() {
        let toml = r#"
            [[columns]]
            key = "when"
            label = "Date"

            [[columns]]
            key = "score"
            label = "Score"

            [fields]
            timestamp = "when"
            rating = "score"
        "#;
        let c = Config::from_toml(toml).unwrap();
        assert_eq!(c.columns.len(), 2);
        assert_eq!(c.columns[1].label, "Score");
        assert_eq!(c.fields.rating, "score");
        assert_eq!(c.date_column(), Some(0));
    }

    #[test]
    fn rejects_zero_page_size_and_unknown_keys() {
        assert!(Config::from_toml("page_size = 0").is_err());
        assert!(Config::from_toml("columns = []").is_err());
        assert!(Config::from_toml("pagesize = 5").is_err());
    }

    #[test]
    fn load_reports_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lens.toml");
        fs::write(&path, "page_size = \"ten\"").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, LensError::Config { .. }));
        assert_eq!(err.exit_code(), 3);

        let missing = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, LensError::NotFound { .. }));
    }
}
