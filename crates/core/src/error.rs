use std::path::PathBuf;

/// Failure to turn a path into a [`crate::model::RuleDocument`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The file does not exist or could not be read.
    #[error("cannot read {}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The bytes left after BOM removal are not valid JSON.
    #[error("malformed JSON in {}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A required part of the rule format is absent or has the wrong shape.
///
/// Rule and substat positions are zero-based indices into `Rules` and the
/// rule's `Substats` array.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("top-level document is not an object")]
    DocumentNotObject,
    #[error("missing required top-level key `Rules`")]
    MissingRules,
    #[error("`Rules` is not an array")]
    RulesNotArray,
    #[error("rule {rule} is not an object")]
    RuleNotObject { rule: usize },
    #[error("rule {rule}: `Substats` is not an array")]
    SubstatsNotArray { rule: usize },
    #[error("rule {rule} substat {substat} is not an object")]
    SubstatNotObject { rule: usize, substat: usize },
    #[error("rule {rule}: missing required field `{field}`")]
    MissingRuleField { field: String, rule: usize },
    #[error("rule {rule} substat {substat}: missing required field `{field}`")]
    MissingSubstatField {
        field: String,
        rule: usize,
        substat: usize,
    },
    #[error("`{field}` is not declared as an optional array field")]
    UndeclaredSequence { field: String },
    #[error("rule {rule}{}: field `{field}` expected {expected}, found {found}", substat_suffix(.substat))]
    WrongType {
        field: String,
        rule: usize,
        substat: Option<usize>,
        expected: &'static str,
        found: &'static str,
    },
}

fn substat_suffix(substat: &Option<usize>) -> String {
    match substat {
        Some(i) => format!(" substat {i}"),
        None => String::new(),
    }
}
