//! Statistics and shape checks over the rules of one decoded document.
//!
//! Every pass reads the same borrowed rule views and writes only its own
//! slot of [`Findings`]. A pass that trips over a missing required field is
//! recorded in [`Findings::skipped`] and the remaining passes still run.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use crate::{
    error::SchemaError,
    model::{Rule, RuleDocument, ScalarValue, Shape},
    schema::{ExpectedShape, FieldSpec, Schema},
};

pub const ARTIFACT_TYPE: &str = "ArtifactType";
pub const ARTIFACT_SET: &str = "ArtifactSet";
pub const SUBSTAT_ID: &str = "ID";
pub const CONDITION: &str = "Condition";

const SAMPLE_RULES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pass {
    MissingFields,
    RuleKeys,
    SubstatKeys,
    ArtifactTypeValues,
    ArtifactTypeShape,
    ArtifactSetShape,
    FieldDomains,
    SubstatIds,
    ConditionValues,
    Sample,
}

impl Pass {
    pub const ALL: [Pass; 10] = [
        Pass::MissingFields,
        Pass::RuleKeys,
        Pass::SubstatKeys,
        Pass::ArtifactTypeValues,
        Pass::ArtifactTypeShape,
        Pass::ArtifactSetShape,
        Pass::FieldDomains,
        Pass::SubstatIds,
        Pass::ConditionValues,
        Pass::Sample,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Pass::MissingFields => "missing-fields",
            Pass::RuleKeys => "rule-keys",
            Pass::SubstatKeys => "substat-keys",
            Pass::ArtifactTypeValues => "artifact-type-values",
            Pass::ArtifactTypeShape => "artifact-type-shape",
            Pass::ArtifactSetShape => "artifact-set-shape",
            Pass::FieldDomains => "field-domains",
            Pass::SubstatIds => "substat-ids",
            Pass::ConditionValues => "condition-values",
            Pass::Sample => "sample",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pass `{0}`")]
pub struct UnknownPass(pub String);

impl FromStr for Pass {
    type Err = UnknownPass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pass::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPass(s.to_string()))
    }
}

/// An ordered selection of passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSet(BTreeSet<Pass>);

impl PassSet {
    pub fn all() -> Self {
        Self(Pass::ALL.into_iter().collect())
    }

    pub fn only<I: IntoIterator<Item = Pass>>(passes: I) -> Self {
        Self(passes.into_iter().collect())
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, UnknownPass> {
        names
            .iter()
            .map(|n| n.as_ref().parse::<Pass>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn without(mut self, pass: Pass) -> Self {
        self.0.remove(&pass);
        self
    }

    pub fn contains(&self, pass: Pass) -> bool {
        self.0.contains(&pass)
    }

    pub fn iter(&self) -> impl Iterator<Item = Pass> + '_ {
        self.0.iter().copied()
    }
}

impl Default for PassSet {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingFieldReport {
    pub field: String,
    pub missing: usize,
    pub total: usize,
    pub missing_ratio: f64,
    pub indices: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeViolation {
    pub index: usize,
    pub value: Value,
    pub type_name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeReport {
    pub field: String,
    pub expected: ExpectedShape,
    /// Rules carrying the field at all.
    pub present: usize,
    pub violations: Vec<usize>,
    pub first_violation: Option<ShapeViolation>,
}

impl ShapeReport {
    pub fn conforms(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDomain {
    pub field: String,
    pub values: Vec<ScalarValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedRule {
    pub index: usize,
    pub rule: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuralSample {
    pub top_level_keys: Vec<String>,
    pub rule_count: usize,
    pub first_rules: Vec<Value>,
    pub first_without_artifact_set: Option<IndexedRule>,
    pub first_with_condition: Option<IndexedRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPass {
    pub pass: Pass,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Findings {
    pub rule_count: usize,
    pub passes_run: Vec<Pass>,
    pub skipped: Vec<SkippedPass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<MissingFieldReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substat_keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_type_values: Option<Vec<ScalarValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_type_shape: Option<ShapeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_set_shape: Option<ShapeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_domains: Option<Vec<FieldDomain>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substat_ids: Option<Vec<ScalarValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<StructuralSample>,
}

impl Findings {
    fn new(rule_count: usize) -> Self {
        Self {
            rule_count,
            passes_run: Vec::new(),
            skipped: Vec::new(),
            missing_fields: None,
            rule_keys: None,
            substat_keys: None,
            artifact_type_values: None,
            artifact_type_shape: None,
            artifact_set_shape: None,
            field_domains: None,
            substat_ids: None,
            condition_values: None,
            sample: None,
        }
    }

    pub fn missing(&self, field: &str) -> Option<&MissingFieldReport> {
        self.missing_fields
            .as_ref()?
            .iter()
            .find(|m| m.field == field)
    }

    pub fn domain(&self, field: &str) -> Option<&[ScalarValue]> {
        self.field_domains
            .as_ref()?
            .iter()
            .find(|d| d.field == field)
            .map(|d| d.values.as_slice())
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Run every pass against the built-in `.hsf` schema.
pub fn analyze(document: &RuleDocument) -> Result<Findings, SchemaError> {
    analyze_with(document, Schema::hsf(), &PassSet::all())
}

/// Run the selected passes.
///
/// Fails only when `Rules` itself cannot be extracted; a failing pass is
/// recorded in [`Findings::skipped`] instead.
pub fn analyze_with(
    document: &RuleDocument,
    schema: &Schema,
    passes: &PassSet,
) -> Result<Findings, SchemaError> {
    let rules = document.rules()?;
    let mut findings = Findings::new(rules.len());

    for pass in passes.iter() {
        match run_pass(pass, document, &rules, schema, &mut findings) {
            Ok(()) => {
                tracing::debug!(pass = pass.as_str(), rules = rules.len(), "pass finished");
                findings.passes_run.push(pass);
            }
            Err(err) => {
                tracing::warn!(pass = pass.as_str(), error = %err, "pass skipped");
                findings.skipped.push(SkippedPass {
                    pass,
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok(findings)
}

fn run_pass(
    pass: Pass,
    document: &RuleDocument,
    rules: &[Rule<'_>],
    schema: &Schema,
    findings: &mut Findings,
) -> Result<(), SchemaError> {
    match pass {
        Pass::MissingFields => findings.missing_fields = Some(missing_fields(rules, schema)),
        Pass::RuleKeys => findings.rule_keys = Some(rule_keys(rules)),
        Pass::SubstatKeys => findings.substat_keys = Some(substat_keys(rules)?),
        Pass::ArtifactTypeValues => {
            let spec = declared_sequence(schema, ARTIFACT_TYPE)?;
            findings.artifact_type_values = Some(sequence_domain(rules, &spec.name))
        }
        Pass::ArtifactTypeShape => {
            let spec = declared_sequence(schema, ARTIFACT_TYPE)?;
            findings.artifact_type_shape = Some(shape_report(rules, spec))
        }
        Pass::ArtifactSetShape => {
            let spec = declared_sequence(schema, ARTIFACT_SET)?;
            findings.artifact_set_shape = Some(shape_report(rules, spec))
        }
        Pass::FieldDomains => findings.field_domains = Some(field_domains(rules, schema)?),
        Pass::SubstatIds => findings.substat_ids = Some(substat_ids(rules, schema)?),
        Pass::ConditionValues => {
            findings.condition_values = Some(condition_values(rules, schema)?)
        }
        Pass::Sample => findings.sample = Some(structural_sample(document, rules)),
    }
    Ok(())
}

pub fn missing_fields(rules: &[Rule<'_>], schema: &Schema) -> Vec<MissingFieldReport> {
    schema
        .absence_tracked()
        .map(|spec| {
            let indices: Vec<usize> = rules
                .iter()
                .filter(|r| !r.has(&spec.name))
                .map(|r| r.index)
                .collect();
            let missing_ratio = if rules.is_empty() {
                0.0
            } else {
                indices.len() as f64 / rules.len() as f64
            };
            MissingFieldReport {
                field: spec.name.clone(),
                missing: indices.len(),
                total: rules.len(),
                missing_ratio,
                indices,
            }
        })
        .collect()
}

pub fn rule_keys(rules: &[Rule<'_>]) -> Vec<String> {
    let keys: BTreeSet<&str> = rules.iter().flat_map(|r| r.keys()).collect();
    keys.into_iter().map(str::to_string).collect()
}

pub fn substat_keys(rules: &[Rule<'_>]) -> Result<Vec<String>, SchemaError> {
    let mut keys: BTreeSet<&str> = BTreeSet::new();
    for rule in rules {
        for sub in rule.substats()? {
            keys.extend(sub.keys());
        }
    }
    Ok(keys.into_iter().map(str::to_string).collect())
}

/// Distinct elements of an optional sequence field. Non-sequence values are
/// left to the shape pass.
pub fn sequence_domain(rules: &[Rule<'_>], field: &str) -> Vec<ScalarValue> {
    let values: BTreeSet<ScalarValue> = rules
        .iter()
        .filter_map(|r| match r.get(field) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        })
        .flatten()
        .map(ScalarValue::from)
        .collect();
    values.into_iter().collect()
}

/// The schema entry for `field`, which must be an optional sequence.
fn declared_sequence<'s>(schema: &'s Schema, field: &str) -> Result<&'s FieldSpec, SchemaError> {
    schema
        .optional_rule_sequences()
        .find(|f| f.name == field)
        .ok_or_else(|| SchemaError::UndeclaredSequence {
            field: field.to_string(),
        })
}

/// Rules where `spec.name` is present but not of the shape `spec` expects.
pub fn shape_report(rules: &[Rule<'_>], spec: &FieldSpec) -> ShapeReport {
    let field = spec.name.as_str();
    let expected = spec.shape;

    let mut present = 0;
    let mut violations = Vec::new();
    let mut first_violation = None;

    for rule in rules {
        let Some(value) = rule.get(field) else {
            continue;
        };
        present += 1;

        let shape = Shape::of(value);
        if expected.accepts(shape) {
            continue;
        }
        violations.push(rule.index);
        if first_violation.is_none() {
            first_violation = Some(ShapeViolation {
                index: rule.index,
                value: value.clone(),
                type_name: shape.type_name(),
            });
        }
    }

    ShapeReport {
        field: field.to_string(),
        expected,
        present,
        violations,
        first_violation,
    }
}

fn check_shape(
    value: &Value,
    expected: ExpectedShape,
    field: &str,
    rule: usize,
    substat: Option<usize>,
) -> Result<(), SchemaError> {
    let shape = Shape::of(value);
    if expected.accepts(shape) {
        Ok(())
    } else {
        Err(SchemaError::WrongType {
            field: field.to_string(),
            rule,
            substat,
            expected: expected.describe(),
            found: shape.type_name(),
        })
    }
}

pub fn field_domains(rules: &[Rule<'_>], schema: &Schema) -> Result<Vec<FieldDomain>, SchemaError> {
    schema
        .required_rule_scalars()
        .map(|spec| {
            let mut values = BTreeSet::new();
            for rule in rules {
                let value = rule.require(&spec.name)?;
                check_shape(value, spec.shape, &spec.name, rule.index, None)?;
                values.insert(ScalarValue::from(value));
            }
            Ok(FieldDomain {
                field: spec.name.clone(),
                values: values.into_iter().collect(),
            })
        })
        .collect()
}

fn substat_shape(schema: &Schema, field: &str, fallback: ExpectedShape) -> ExpectedShape {
    schema
        .substat_field(field)
        .map(|f| f.shape)
        .unwrap_or(fallback)
}

pub fn substat_ids(rules: &[Rule<'_>], schema: &Schema) -> Result<Vec<ScalarValue>, SchemaError> {
    let expected = substat_shape(schema, SUBSTAT_ID, ExpectedShape::Scalar);
    let mut ids = BTreeSet::new();
    for rule in rules {
        for sub in rule.substats()? {
            let id = sub.require(SUBSTAT_ID)?;
            check_shape(id, expected, SUBSTAT_ID, sub.rule, Some(sub.index))?;
            ids.insert(ScalarValue::from(id));
        }
    }
    Ok(ids.into_iter().collect())
}

pub fn condition_values(rules: &[Rule<'_>], schema: &Schema) -> Result<Vec<String>, SchemaError> {
    let expected = substat_shape(schema, CONDITION, ExpectedShape::Text);
    let mut conditions: BTreeSet<String> = BTreeSet::new();
    for rule in rules {
        for sub in rule.substats()? {
            let cond = sub.require(CONDITION)?;
            check_shape(cond, expected, CONDITION, sub.rule, Some(sub.index))?;
            conditions.insert(match cond {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        }
    }
    Ok(conditions.into_iter().collect())
}

/// Snapshot of the document for manual inspection. Never fails.
pub fn structural_sample(document: &RuleDocument, rules: &[Rule<'_>]) -> StructuralSample {
    let first_without_artifact_set = rules
        .iter()
        .find(|r| !r.has(ARTIFACT_SET))
        .map(|r| IndexedRule {
            index: r.index,
            rule: r.as_value(),
        });

    let first_with_condition = rules
        .iter()
        .find(|r| {
            r.substats_lenient().any(|s| {
                s.get(CONDITION)
                    .and_then(Value::as_str)
                    .is_some_and(|c| !c.is_empty())
            })
        })
        .map(|r| IndexedRule {
            index: r.index,
            rule: r.as_value(),
        });

    StructuralSample {
        top_level_keys: document.top_level_keys(),
        rule_count: rules.len(),
        first_rules: rules.iter().take(SAMPLE_RULES).map(Rule::as_value).collect(),
        first_without_artifact_set,
        first_with_condition,
    }
}
