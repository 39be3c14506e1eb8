//! Field descriptor for the `.hsf` rule format.
//!
//! The format has no published schema. Which fields are load-bearing and
//! which may be left out is recorded here as data so the analyzer never
//! hard-codes it.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::model::{Shape, SUBSTATS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Presence {
    Required,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpectedShape {
    /// Any non-container value.
    Scalar,
    Sequence,
    Text,
}

impl ExpectedShape {
    pub fn describe(self) -> &'static str {
        match self {
            ExpectedShape::Scalar => "scalar",
            ExpectedShape::Sequence => "array",
            ExpectedShape::Text => "string",
        }
    }

    pub fn accepts(self, shape: Shape) -> bool {
        match self {
            ExpectedShape::Scalar => shape.is_scalar(),
            ExpectedShape::Sequence => shape == Shape::Array,
            ExpectedShape::Text => shape == Shape::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub presence: Presence,
    pub shape: ExpectedShape,
    /// Report how many rules leave this field out.
    pub track_absence: bool,
}

impl FieldSpec {
    pub fn required(name: &str, shape: ExpectedShape) -> Self {
        Self {
            name: name.to_string(),
            presence: Presence::Required,
            shape,
            track_absence: false,
        }
    }

    pub fn optional(name: &str, shape: ExpectedShape) -> Self {
        Self {
            name: name.to_string(),
            presence: Presence::Optional,
            shape,
            track_absence: false,
        }
    }

    pub fn tracked(mut self) -> Self {
        self.track_absence = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub rule_fields: Vec<FieldSpec>,
    pub substat_fields: Vec<FieldSpec>,
}

static HSF_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema {
    rule_fields: vec![
        FieldSpec::required("MainStatID", ExpectedShape::Scalar),
        FieldSpec::required("MainStatF", ExpectedShape::Scalar),
        FieldSpec::required("Rarity", ExpectedShape::Scalar),
        FieldSpec::required("Rank", ExpectedShape::Scalar),
        FieldSpec::required("Faction", ExpectedShape::Scalar),
        FieldSpec::optional("ArtifactType", ExpectedShape::Sequence),
        FieldSpec::optional("ArtifactSet", ExpectedShape::Sequence).tracked(),
        FieldSpec::optional(SUBSTATS, ExpectedShape::Sequence),
    ],
    substat_fields: vec![
        FieldSpec::required("ID", ExpectedShape::Scalar),
        FieldSpec::required("Condition", ExpectedShape::Text),
    ],
});

impl Schema {
    /// The built-in descriptor for `.hsf` farming rules.
    pub fn hsf() -> &'static Schema {
        &HSF_SCHEMA
    }

    pub fn substat_field(&self, name: &str) -> Option<&FieldSpec> {
        self.substat_fields.iter().find(|f| f.name == name)
    }

    pub fn required_rule_scalars(&self) -> impl Iterator<Item = &FieldSpec> {
        self.rule_fields
            .iter()
            .filter(|f| f.presence == Presence::Required && f.shape == ExpectedShape::Scalar)
    }

    /// Optional array-valued rule fields, not counting `Substats`, whose
    /// elements are checked field by field instead.
    pub fn optional_rule_sequences(&self) -> impl Iterator<Item = &FieldSpec> {
        self.rule_fields.iter().filter(|f| {
            f.presence == Presence::Optional
                && f.shape == ExpectedShape::Sequence
                && f.name != SUBSTATS
        })
    }

    pub fn absence_tracked(&self) -> impl Iterator<Item = &FieldSpec> {
        self.rule_fields.iter().filter(|f| f.track_absence)
    }
}
