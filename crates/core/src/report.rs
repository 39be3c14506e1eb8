use std::fmt::Display;

use serde::Serialize;

use crate::{
    analyze::{Findings, ShapeReport},
    decode::SourceInfo,
};

pub const REPORT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub report_version: String,
    pub inputs: Inputs,
    pub findings: Findings,
}

#[derive(Debug, Clone, Serialize)]
pub struct Inputs {
    pub input_path: String,
    pub size_bytes: u64,
    pub has_bom: bool,
}

impl From<SourceInfo> for Inputs {
    fn from(source: SourceInfo) -> Self {
        Self {
            input_path: source.path,
            size_bytes: source.size_bytes,
            has_bom: source.has_bom,
        }
    }
}

/// `[a, b, c]` using each item's `Display`.
pub fn list<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    let parts: Vec<String> = items.into_iter().map(|i| i.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Like [`list`] but quotes each string.
pub fn quoted_list<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    list(items.into_iter().map(|s| format!("{:?}", s.as_ref())))
}

impl Report {
    pub fn new(source: SourceInfo, findings: Findings) -> Self {
        Self {
            report_version: REPORT_VERSION.to_string(),
            inputs: source.into(),
            findings,
        }
    }

    pub fn to_markdown(&self) -> String {
        let f = &self.findings;
        let mut s = String::new();
        s.push_str("# hsfscan report\n\n");
        s.push_str(&format!("- report_version: `{}`\n", self.report_version));
        s.push_str(&format!("- input_path: `{}`\n", self.inputs.input_path));
        s.push_str(&format!("- size_bytes: `{}`\n", self.inputs.size_bytes));
        s.push_str(&format!("- has_bom: `{}`\n", self.inputs.has_bom));
        s.push_str(&format!("- rule_count: `{}`\n", f.rule_count));
        s.push('\n');

        if let Some(missing) = &f.missing_fields {
            s.push_str("## Missing optional fields\n\n");
            for m in missing {
                s.push_str(&format!(
                    "- {}: `{}` of `{}` rules ({:.1}%)\n",
                    m.field,
                    m.missing,
                    m.total,
                    m.missing_ratio * 100.0
                ));
                s.push_str(&format!("  - indices: `{}`\n", list(&m.indices)));
            }
            s.push('\n');
        }

        if f.rule_keys.is_some() || f.substat_keys.is_some() {
            s.push_str("## Keys\n\n");
            if let Some(keys) = &f.rule_keys {
                s.push_str(&format!("- rule_keys: `{}`\n", quoted_list(keys)));
            }
            if let Some(keys) = &f.substat_keys {
                s.push_str(&format!("- substat_keys: `{}`\n", quoted_list(keys)));
            }
            s.push('\n');
        }

        if f.artifact_type_values.is_some()
            || f.artifact_type_shape.is_some()
            || f.artifact_set_shape.is_some()
        {
            s.push_str("## Sequence fields\n\n");
            if let Some(values) = &f.artifact_type_values {
                s.push_str(&format!("- ArtifactType values: `{}`\n", list(values)));
            }
            for shape in [&f.artifact_type_shape, &f.artifact_set_shape]
                .into_iter()
                .flatten()
            {
                push_shape(&mut s, shape);
            }
            s.push('\n');
        }

        if f.field_domains.is_some() || f.substat_ids.is_some() || f.condition_values.is_some() {
            s.push_str("## Value domains\n\n");
            for d in f.field_domains.iter().flatten() {
                s.push_str(&format!("- {}: `{}`\n", d.field, list(&d.values)));
            }
            if let Some(ids) = &f.substat_ids {
                s.push_str(&format!("- Substats.ID: `{}`\n", list(ids)));
            }
            if let Some(conds) = &f.condition_values {
                s.push_str(&format!("- Substats.Condition: `{}`\n", quoted_list(conds)));
            }
            s.push('\n');
        }

        if let Some(sample) = &f.sample {
            s.push_str("## Sample\n\n");
            s.push_str(&format!(
                "- top_level_keys: `{}`\n",
                quoted_list(&sample.top_level_keys)
            ));
            s.push_str(&format!("- first_rules: `{}`\n", sample.first_rules.len()));
            s.push_str(&format!(
                "- first_without_artifact_set: {}\n",
                index_or_none(sample.first_without_artifact_set.as_ref().map(|r| r.index))
            ));
            s.push_str(&format!(
                "- first_with_condition: {}\n",
                index_or_none(sample.first_with_condition.as_ref().map(|r| r.index))
            ));
            s.push('\n');
        }

        s.push_str("## Skipped passes\n\n");
        if f.skipped.is_empty() {
            s.push_str("- (none)\n");
        } else {
            for skip in &f.skipped {
                s.push_str(&format!("- {}: {}\n", skip.pass, skip.reason));
            }
        }

        s
    }
}

fn index_or_none(index: Option<usize>) -> String {
    match index {
        Some(i) => format!("rule `{i}`"),
        None => "(none)".to_string(),
    }
}

fn push_shape(s: &mut String, shape: &ShapeReport) {
    if shape.conforms() {
        s.push_str(&format!(
            "- {}: always {} when present (`{}` rules)\n",
            shape.field,
            shape.expected.describe(),
            shape.present
        ));
        return;
    }
    s.push_str(&format!(
        "- {}: not {} in rules `{}`\n",
        shape.field,
        shape.expected.describe(),
        list(&shape.violations)
    ));
    if let Some(v) = &shape.first_violation {
        s.push_str(&format!(
            "  - first: rule `{}` is {}: `{}`\n",
            v.index, v.type_name, v.value
        ));
    }
}
