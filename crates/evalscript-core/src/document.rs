// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serde-facing configuration documents (JSON / YAML).
//!
//! Documents mirror the typed model field for field but keep every value in
//! its raw form so that defaults, explicit `null` and empty strings can be
//! told apart. [`EvalScript::try_from`] runs validation and reports errors
//! with their full field path, e.g. `setup.output[1].bands`.
//!
//! Keys are accepted in the script's camelCase spelling as well as
//! snake_case (`sampleType` / `sample_type`, `evaluatePixel` /
//! `evaluate_pixel`, ...). Serialization always uses camelCase.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::ValidationError;
use crate::functions::FunctionBlocks;
use crate::program::EvalScript;
use crate::setup::{
    InputSpec, MosaickingMode, OutputSpec, Outputs, SampleType, SetupSpec, Units, DEFAULT_OUTPUT_ID,
};

/// Error raised while reading a configuration document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Malformed JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Malformed YAML.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Well-formed document with invalid contents.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Serialization format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    /// JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

impl DocumentFormat {
    /// Guess the format from a file extension (`.json`, `.yaml`, `.yml`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!("unknown document format: {other}")),
        }
    }
}

// ─── Document types ──────────────────────────────────────────────────────────

/// Root configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalScriptDoc {
    /// Setup section; absent is reported as a missing field, not a parse error.
    #[serde(alias = "setup_obj", default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<SetupDoc>,
    /// Hook bodies.
    #[serde(alias = "eval_functions", alias = "evalFunctions", default)]
    pub functions: FunctionsDoc,
}

/// Raw `setup` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupDoc {
    /// Input declarations.
    #[serde(alias = "inputs", default)]
    pub input: Vec<InputDoc>,
    /// Output declaration(s).
    #[serde(alias = "outputs", default)]
    pub output: Option<OutputsDoc>,
    /// Mosaicking keyword; `null` or `""` suppresses it.
    #[serde(
        alias = "mosaickingMode",
        alias = "mosaicking_mode",
        default = "default_mosaicking"
    )]
    pub mosaicking: Option<String>,
}

/// Raw input declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDoc {
    /// Band names.
    #[serde(default)]
    pub bands: Vec<String>,
    /// Unit or per-band units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<UnitsDoc>,
}

/// Raw units: a string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitsDoc {
    /// `"DN"`.
    Single(String),
    /// `["DN", "REFLECTANCE"]`.
    PerBand(Vec<String>),
}

/// Raw output: an object or a list of objects.
///
/// `List` is tried first: derived structs also accept sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputsDoc {
    /// Multi-output form.
    List(Vec<OutputDoc>),
    /// Single-output form.
    Single(OutputDoc),
}

/// Raw output declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDoc {
    /// Output id; absent or `null` means `"default"`.
    #[serde(default = "default_output_id")]
    pub id: Option<String>,
    /// Band count.
    #[serde(default)]
    pub bands: Option<i64>,
    /// Sample type keyword; `null` or `""` suppresses it.
    #[serde(
        rename = "sampleType",
        alias = "sample_type",
        default = "default_sample_type"
    )]
    pub sample_type: Option<String>,
    /// No-data value.
    #[serde(
        rename = "nodataValue",
        alias = "nodata_value",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub nodata_value: Option<f64>,
}

/// Raw hook bodies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionsDoc {
    /// `preProcessScenes` body.
    #[serde(
        rename = "preProcessScenes",
        alias = "pre_process_scenes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_process_scenes: Option<String>,
    /// `evaluatePixel` body (required).
    #[serde(rename = "evaluatePixel", alias = "evaluate_pixel", default)]
    pub evaluate_pixel: Option<String>,
    /// `updateOutput` body.
    #[serde(
        rename = "updateOutput",
        alias = "update_output",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub update_output: Option<String>,
    /// `updateOutputMetadata` body.
    #[serde(
        rename = "updateOutputMetadata",
        alias = "update_output_metadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub update_output_metadata: Option<String>,
}

#[allow(clippy::unnecessary_wraps)]
fn default_mosaicking() -> Option<String> {
    Some(MosaickingMode::default().as_str().to_owned())
}

#[allow(clippy::unnecessary_wraps)]
fn default_output_id() -> Option<String> {
    Some(DEFAULT_OUTPUT_ID.to_owned())
}

#[allow(clippy::unnecessary_wraps)]
fn default_sample_type() -> Option<String> {
    Some(SampleType::default().as_str().to_owned())
}

impl EvalScriptDoc {
    /// Parse a document without validating its contents.
    pub fn parse(text: &str, format: DocumentFormat) -> Result<Self, DocumentError> {
        let doc = match format {
            DocumentFormat::Json => serde_json::from_str(text)?,
            DocumentFormat::Yaml => serde_yaml::from_str(text)?,
        };
        Ok(doc)
    }

    /// Serialize the document.
    pub fn to_text(&self, format: DocumentFormat) -> Result<String, DocumentError> {
        let text = match format {
            DocumentFormat::Json => serde_json::to_string_pretty(self)?,
            DocumentFormat::Yaml => serde_yaml::to_string(self)?,
        };
        Ok(text)
    }
}

// ─── Validation ──────────────────────────────────────────────────────────────

impl TryFrom<&EvalScriptDoc> for EvalScript {
    type Error = ValidationError;

    fn try_from(doc: &EvalScriptDoc) -> Result<Self, Self::Error> {
        let setup = doc
            .setup
            .as_ref()
            .ok_or_else(|| ValidationError::missing("setup"))?;
        let setup = SetupSpec::try_from(setup).map_err(|e| e.at("setup"))?;
        let functions = FunctionBlocks::try_from(&doc.functions).map_err(|e| e.at("functions"))?;
        debug!(
            inputs = setup.inputs().len(),
            outputs = setup.outputs().specs().len(),
            "validated evalscript document"
        );
        Ok(Self::new(setup, functions))
    }
}

impl TryFrom<&SetupDoc> for SetupSpec {
    type Error = ValidationError;

    fn try_from(doc: &SetupDoc) -> Result<Self, Self::Error> {
        if doc.input.is_empty() {
            return Err(ValidationError::missing("input"));
        }
        let inputs = doc
            .input
            .iter()
            .enumerate()
            .map(|(i, input)| InputSpec::try_from(input).map_err(|e| e.at(&format!("input[{i}]"))))
            .collect::<Result<Vec<_>, _>>()?;

        let outputs = match &doc.output {
            None => return Err(ValidationError::missing("output")),
            Some(OutputsDoc::Single(output)) => {
                Outputs::Single(OutputSpec::try_from(output).map_err(|e| e.at("output"))?)
            }
            Some(OutputsDoc::List(outputs)) => Outputs::List(
                outputs
                    .iter()
                    .enumerate()
                    .map(|(i, output)| {
                        OutputSpec::try_from(output).map_err(|e| e.at(&format!("output[{i}]")))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };

        let mosaicking = match non_empty(doc.mosaicking.as_deref()) {
            Some(mode) => Some(mode.parse::<MosaickingMode>()?),
            None => None,
        };

        Ok(Self::new(inputs, outputs)?.with_mosaicking(mosaicking))
    }
}

impl TryFrom<&InputDoc> for InputSpec {
    type Error = ValidationError;

    fn try_from(doc: &InputDoc) -> Result<Self, Self::Error> {
        let input = Self::new(doc.bands.iter().cloned())?;
        Ok(match &doc.units {
            None => input,
            Some(UnitsDoc::Single(unit)) => input.with_units(Units::Single(unit.clone())),
            Some(UnitsDoc::PerBand(units)) => input.with_units(Units::PerBand(units.clone())),
        })
    }
}

impl TryFrom<&OutputDoc> for OutputSpec {
    type Error = ValidationError;

    fn try_from(doc: &OutputDoc) -> Result<Self, Self::Error> {
        let bands = doc.bands.ok_or_else(|| ValidationError::missing("bands"))?;
        if bands <= 0 {
            return Err(ValidationError::invalid(
                "bands",
                format!("band count must be positive, got {bands}"),
            ));
        }
        let bands = u32::try_from(bands)
            .map_err(|_| ValidationError::invalid("bands", format!("band count {bands} is out of range")))?;

        let mut output = Self::new(bands)?;
        if let Some(id) = &doc.id {
            output = output.with_id(id.clone())?;
        }
        let sample_type = match non_empty(doc.sample_type.as_deref()) {
            Some(keyword) => Some(keyword.parse::<SampleType>()?),
            None => None,
        };
        output
            .with_sample_type(sample_type)
            .with_nodata_value(doc.nodata_value)
    }
}

impl TryFrom<&FunctionsDoc> for FunctionBlocks {
    type Error = ValidationError;

    fn try_from(doc: &FunctionsDoc) -> Result<Self, Self::Error> {
        let evaluate_pixel = doc
            .evaluate_pixel
            .clone()
            .ok_or_else(|| ValidationError::missing("evaluatePixel"))?;
        let mut blocks = Self::new(evaluate_pixel)?;
        if let Some(body) = &doc.pre_process_scenes {
            blocks = blocks.with_pre_process_scenes(body.clone());
        }
        if let Some(body) = &doc.update_output {
            blocks = blocks.with_update_output(body.clone());
        }
        if let Some(body) = &doc.update_output_metadata {
            blocks = blocks.with_update_output_metadata(body.clone());
        }
        Ok(blocks)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl EvalScript {
    /// Parse and validate a configuration document.
    pub fn from_document(text: &str, format: DocumentFormat) -> Result<Self, DocumentError> {
        let doc = EvalScriptDoc::parse(text, format)?;
        Ok(Self::try_from(&doc)?)
    }
}

// ─── Normalized documents ────────────────────────────────────────────────────

impl From<&EvalScript> for EvalScriptDoc {
    fn from(script: &EvalScript) -> Self {
        let setup = script.setup();
        let output = match setup.outputs() {
            Outputs::Single(spec) => OutputsDoc::Single(spec.into()),
            Outputs::List(specs) => OutputsDoc::List(specs.iter().map(OutputDoc::from).collect()),
        };
        let functions = script.functions();
        Self {
            setup: Some(SetupDoc {
                input: setup.inputs().iter().map(InputDoc::from).collect(),
                output: Some(output),
                mosaicking: setup.mosaicking().map(|mode| mode.as_str().to_owned()),
            }),
            functions: FunctionsDoc {
                pre_process_scenes: functions.pre_process_scenes().map(str::to_owned),
                evaluate_pixel: Some(functions.evaluate_pixel().to_owned()),
                update_output: functions.update_output().map(str::to_owned),
                update_output_metadata: functions.update_output_metadata().map(str::to_owned),
            },
        }
    }
}

impl From<&InputSpec> for InputDoc {
    fn from(spec: &InputSpec) -> Self {
        Self {
            bands: spec.bands().to_vec(),
            units: spec.units().map(|units| match units {
                Units::Single(unit) => UnitsDoc::Single(unit.clone()),
                Units::PerBand(units) => UnitsDoc::PerBand(units.clone()),
            }),
        }
    }
}

impl From<&OutputSpec> for OutputDoc {
    fn from(spec: &OutputSpec) -> Self {
        Self {
            id: Some(spec.id().to_owned()),
            bands: Some(i64::from(spec.bands())),
            sample_type: spec.sample_type().map(|t| t.as_str().to_owned()),
            nodata_value: spec.nodata_value(),
        }
    }
}
