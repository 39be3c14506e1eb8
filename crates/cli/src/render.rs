use hsfscan_core::analyze::{Findings, IndexedRule, ShapeReport, StructuralSample};
use hsfscan_core::decode::ByteDump;
use hsfscan_core::report::{list, quoted_list, Report};

/// Field-by-field listing, one line per statistic.
pub fn field_analysis(findings: &Findings) -> String {
    let mut s = String::new();

    for m in findings.missing_fields.iter().flatten() {
        s.push_str(&format!(
            "Rules without {}: {} out of {}\n",
            m.field, m.missing, m.total
        ));
        s.push_str(&format!("  Indices: {}\n", list(&m.indices)));
    }
    if let Some(keys) = &findings.rule_keys {
        s.push_str(&format!("All rule keys: {}\n", quoted_list(keys)));
    }
    if let Some(keys) = &findings.substat_keys {
        s.push_str(&format!("All substat keys: {}\n", quoted_list(keys)));
    }
    if let Some(values) = &findings.artifact_type_values {
        s.push_str(&format!("All ArtifactType values: {}\n", list(values)));
    }
    if let Some(shape) = &findings.artifact_type_shape {
        s.push_str(&format!(
            "Rules where {} is not {}: {}\n",
            shape.field,
            shape.expected.describe(),
            list(&shape.violations)
        ));
    }
    if let Some(shape) = &findings.artifact_set_shape {
        s.push_str(&shape_check(shape));
    }
    for d in findings.field_domains.iter().flatten() {
        s.push_str(&format!("All {} values: {}\n", d.field, list(&d.values)));
    }
    if let Some(ids) = &findings.substat_ids {
        s.push_str(&format!("All Substat IDs: {}\n", list(ids)));
    }
    if let Some(conds) = &findings.condition_values {
        s.push_str(&format!("All Condition values: {}\n", quoted_list(conds)));
    }

    s
}

/// `always a ...` line or the first offending rule.
pub fn shape_check(shape: &ShapeReport) -> String {
    match &shape.first_violation {
        None => format!(
            "{} is always {} when present\n",
            shape.field,
            shape.expected.describe()
        ),
        Some(v) => format!(
            "Rule {}: {} is {}: {} ({} violation(s) at {})\n",
            v.index,
            shape.field,
            v.type_name,
            v.value,
            shape.violations.len(),
            list(&shape.violations)
        ),
    }
}

fn pretty_rule(s: &mut String, heading: &str, rule: &serde_json::Value) {
    s.push_str(&format!("\n{heading}:\n"));
    s.push_str(&format!("{rule:#}\n"));
}

fn indexed(s: &mut String, heading: &str, found: Option<&IndexedRule>) {
    match found {
        Some(r) => pretty_rule(s, &format!("{heading} (index {})", r.index), &r.rule),
        None => s.push_str(&format!("\n{heading}: none\n")),
    }
}

/// Top-level layout plus the first two rules verbatim.
pub fn structure(report: &Report, sample: &StructuralSample) -> String {
    let mut s = String::new();
    let has_bom = if report.inputs.has_bom { "yes" } else { "no" };
    s.push_str(&format!("Has BOM: {has_bom}\n"));
    s.push_str(&format!(
        "Top-level keys: {}\n",
        quoted_list(&sample.top_level_keys)
    ));
    s.push_str(&format!("Number of rules: {}\n", sample.rule_count));

    for (heading, rule) in ["First rule", "Second rule"].iter().zip(&sample.first_rules) {
        pretty_rule(&mut s, heading, rule);
    }
    s
}

/// Byte-level view of the file and the samples used to check it by hand.
pub fn raw(dump: &ByteDump, findings: &Findings) -> String {
    let mut s = String::new();
    s.push_str(&format!("File size: {} bytes\n", dump.size_bytes));
    s.push_str(&format!("First bytes: b\"{}\"\n", dump.head));
    s.push_str(&format!("Last bytes: b\"{}\"\n", dump.tail));
    s.push('\n');

    if let Some(shape) = &findings.artifact_set_shape {
        s.push_str(&shape_check(shape));
    }
    if let Some(sample) = &findings.sample {
        indexed(
            &mut s,
            "First rule without ArtifactSet",
            sample.first_without_artifact_set.as_ref(),
        );
        indexed(
            &mut s,
            "First rule with substat conditions",
            sample.first_with_condition.as_ref(),
        );
    }
    s
}

/// Everything the selected passes produced.
pub fn full(report: &Report) -> String {
    let mut s = String::new();
    s.push_str(&format!("File: {}\n", report.inputs.input_path));
    s.push_str(&format!("Rules: {}\n", report.findings.rule_count));
    s.push('\n');
    s.push_str(&field_analysis(&report.findings));

    if let Some(sample) = &report.findings.sample {
        s.push('\n');
        s.push_str(&structure(report, sample));
        indexed(
            &mut s,
            "First rule without ArtifactSet",
            sample.first_without_artifact_set.as_ref(),
        );
        indexed(
            &mut s,
            "First rule with substat conditions",
            sample.first_with_condition.as_ref(),
        );
    }
    s
}
