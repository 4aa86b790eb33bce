// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The `setup()` block: declared inputs, outputs and mosaicking mode.
//!
//! Values are validated when they are constructed, so a [`SetupSpec`] that
//! exists can always be rendered. Strings (band names, units, ids) are
//! embedded between double quotes verbatim; escaping them is the caller's
//! responsibility.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::ValidationError;

/// Output id the service assumes when none is declared.
pub const DEFAULT_OUTPUT_ID: &str = "default";

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Units attached to an input declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Units {
    /// One unit applied to every band, rendered as `"DN"`.
    Single(String),
    /// One unit per band, in band order, rendered as `["DN","REFLECTANCE"]`.
    PerBand(Vec<String>),
}

impl Units {
    fn render(&self) -> String {
        match self {
            Self::Single(unit) => quoted(unit),
            Self::PerBand(units) => quoted_list(units),
        }
    }
}

impl From<&str> for Units {
    fn from(unit: &str) -> Self {
        Self::Single(unit.to_owned())
    }
}

impl From<String> for Units {
    fn from(unit: String) -> Self {
        Self::Single(unit)
    }
}

impl From<Vec<String>> for Units {
    fn from(units: Vec<String>) -> Self {
        Self::PerBand(units)
    }
}

/// One entry of the `input` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    bands: Vec<String>,
    units: Option<Units>,
}

impl InputSpec {
    /// Declare an input over `bands`. Band order is significant to the service.
    pub fn new<I, S>(bands: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let bands: Vec<String> = bands.into_iter().map(Into::into).collect();
        if bands.is_empty() {
            return Err(ValidationError::missing("bands"));
        }
        Ok(Self { bands, units: None })
    }

    /// Attach units. A per-band list whose length differs from the band count
    /// is accepted as-is and only logged.
    #[must_use]
    pub fn with_units(mut self, units: impl Into<Units>) -> Self {
        let units = units.into();
        if let Units::PerBand(list) = &units {
            if list.len() != self.bands.len() {
                warn!(
                    bands = self.bands.len(),
                    units = list.len(),
                    "per-band units length differs from band count"
                );
            }
        }
        self.units = Some(units);
        self
    }

    /// Declared band names.
    pub fn bands(&self) -> &[String] {
        &self.bands
    }

    /// Declared units, if any.
    pub fn units(&self) -> Option<&Units> {
        self.units.as_ref()
    }

    fn render(&self) -> String {
        let mut out = format!("{{bands: {}", quoted_list(&self.bands));
        if let Some(units) = &self.units {
            out.push_str(", units: ");
            out.push_str(&units.render());
        }
        out.push('}');
        out
    }
}

// ─── Outputs ─────────────────────────────────────────────────────────────────

/// Sample type of an output raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleType {
    /// Signed 8-bit integer.
    Int8,
    /// Unsigned 8-bit integer.
    Uint8,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    Uint16,
    /// 32-bit float.
    Float32,
    /// Let the service pick from the requested output format.
    #[default]
    Auto,
}

impl SampleType {
    /// Keyword as written in the script.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int8 => "INT8",
            Self::Uint8 => "UINT8",
            Self::Int16 => "INT16",
            Self::Uint16 => "UINT16",
            Self::Float32 => "FLOAT32",
            Self::Auto => "AUTO",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INT8" => Ok(Self::Int8),
            "UINT8" => Ok(Self::Uint8),
            "INT16" => Ok(Self::Int16),
            "UINT16" => Ok(Self::Uint16),
            "FLOAT32" => Ok(Self::Float32),
            "AUTO" => Ok(Self::Auto),
            _ => Err(ValidationError::invalid(
                "sampleType",
                format!("unknown sample type {s:?} (expected INT8, UINT8, INT16, UINT16, FLOAT32 or AUTO)"),
            )),
        }
    }
}

/// One output declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    id: String,
    bands: u32,
    sample_type: Option<SampleType>,
    nodata_value: Option<f64>,
}

impl OutputSpec {
    /// Declare an output with `bands` bands, id `"default"` and sample type `AUTO`.
    pub fn new(bands: u32) -> Result<Self, ValidationError> {
        if bands == 0 {
            return Err(ValidationError::invalid("bands", "band count must be positive"));
        }
        Ok(Self {
            id: DEFAULT_OUTPUT_ID.to_owned(),
            bands,
            sample_type: Some(SampleType::Auto),
            nodata_value: None,
        })
    }

    /// Set the output id.
    pub fn with_id(mut self, id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::invalid("id", "output id must not be empty"));
        }
        self.id = id;
        Ok(self)
    }

    /// Set or clear the sample type. `None` suppresses the property.
    #[must_use]
    pub fn with_sample_type(mut self, sample_type: Option<SampleType>) -> Self {
        self.sample_type = sample_type;
        self
    }

    /// Set or clear the no-data value. Must be finite.
    pub fn with_nodata_value(mut self, nodata_value: Option<f64>) -> Result<Self, ValidationError> {
        if let Some(value) = nodata_value {
            if !value.is_finite() {
                return Err(ValidationError::invalid(
                    "nodataValue",
                    format!("{value} has no numeric literal form"),
                ));
            }
        }
        self.nodata_value = nodata_value;
        Ok(self)
    }

    /// Output id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Band count.
    pub fn bands(&self) -> u32 {
        self.bands
    }

    /// Sample type, if emitted.
    pub fn sample_type(&self) -> Option<SampleType> {
        self.sample_type
    }

    /// No-data value, if emitted.
    pub fn nodata_value(&self) -> Option<f64> {
        self.nodata_value
    }

    fn render(&self, explicit_id: bool) -> String {
        let mut props = Vec::with_capacity(4);
        if explicit_id || self.id != DEFAULT_OUTPUT_ID {
            props.push(format!("id: {}", quoted(&self.id)));
        }
        props.push(format!("bands: {}", self.bands));
        if let Some(sample_type) = self.sample_type {
            props.push(format!("sampleType: {}", quoted(sample_type.as_str())));
        }
        if let Some(nodata) = self.nodata_value {
            props.push(format!("nodataValue: {nodata}"));
        }
        format!("{{{}}}", props.join(", "))
    }
}

/// The `output` property: one object, or a list of objects.
///
/// The two shapes mean different things to the service and render differently:
/// list entries always carry `id`, a single object only when it is not the
/// default.
#[derive(Debug, Clone, PartialEq)]
pub enum Outputs {
    /// Single-output declaration.
    Single(OutputSpec),
    /// Multi-output declaration.
    List(Vec<OutputSpec>),
}

impl Outputs {
    /// Output declarations in order.
    pub fn specs(&self) -> &[OutputSpec] {
        match self {
            Self::Single(spec) => std::slice::from_ref(spec),
            Self::List(specs) => specs,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Single(spec) => spec.render(false),
            Self::List(specs) => {
                let entries: Vec<String> = specs.iter().map(|spec| spec.render(true)).collect();
                format!("[{}]", entries.join(", "))
            }
        }
    }
}

impl From<OutputSpec> for Outputs {
    fn from(spec: OutputSpec) -> Self {
        Self::Single(spec)
    }
}

impl From<Vec<OutputSpec>> for Outputs {
    fn from(specs: Vec<OutputSpec>) -> Self {
        Self::List(specs)
    }
}

// ─── Mosaicking ──────────────────────────────────────────────────────────────

/// How overlapping scenes are combined before `evaluatePixel` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MosaickingMode {
    /// One sample per pixel, taken from the first matching scene.
    #[default]
    Simple,
    /// One sample per orbit.
    Orbit,
    /// One sample per tile.
    Tile,
}

impl MosaickingMode {
    /// Keyword as written in the script.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "SIMPLE",
            Self::Orbit => "ORBIT",
            Self::Tile => "TILE",
        }
    }
}

impl fmt::Display for MosaickingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MosaickingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SIMPLE" => Ok(Self::Simple),
            "ORBIT" => Ok(Self::Orbit),
            "TILE" => Ok(Self::Tile),
            _ => Err(ValidationError::invalid(
                "mosaicking",
                format!("unknown mosaicking mode {s:?} (expected SIMPLE, ORBIT or TILE)"),
            )),
        }
    }
}

// ─── Setup ───────────────────────────────────────────────────────────────────

/// Validated contents of the `setup()` return object.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupSpec {
    inputs: Vec<InputSpec>,
    outputs: Outputs,
    mosaicking: Option<MosaickingMode>,
}

impl SetupSpec {
    /// Build a setup with the default `SIMPLE` mosaicking.
    pub fn new(inputs: Vec<InputSpec>, outputs: impl Into<Outputs>) -> Result<Self, ValidationError> {
        if inputs.is_empty() {
            return Err(ValidationError::missing("input"));
        }
        let outputs = outputs.into();
        if let Outputs::List(specs) = &outputs {
            if specs.is_empty() {
                return Err(ValidationError::missing("output"));
            }
        }
        Ok(Self {
            inputs,
            outputs,
            mosaicking: Some(MosaickingMode::default()),
        })
    }

    /// Set or clear the mosaicking mode. `None` drops the property entirely.
    #[must_use]
    pub fn with_mosaicking(mut self, mosaicking: Option<MosaickingMode>) -> Self {
        self.mosaicking = mosaicking;
        self
    }

    /// Input declarations in order.
    pub fn inputs(&self) -> &[InputSpec] {
        &self.inputs
    }

    /// Output declaration(s).
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    /// Mosaicking mode, if emitted.
    pub fn mosaicking(&self) -> Option<MosaickingMode> {
        self.mosaicking
    }

    /// Render the complete `function setup() { ... }` block, newline-terminated.
    pub fn render(&self) -> String {
        let inputs: Vec<String> = self.inputs.iter().map(InputSpec::render).collect();
        let mosaicking = self
            .mosaicking
            .map(|mode| format!(",\n        mosaicking: {}", quoted(mode.as_str())))
            .unwrap_or_default();
        format!(
            "function setup() {{\n    return {{\n        input: [{}],\n        output: {}{}\n    }};\n}}\n",
            inputs.join(", "),
            self.outputs.render(),
            mosaicking,
        )
    }
}

fn quoted(value: &str) -> String {
    format!("\"{value}\"")
}

fn quoted_list(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| quoted(v)).collect();
    format!("[{}]", items.join(","))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    use super::*;

    fn rgb_input() -> InputSpec {
        InputSpec::new(["B02", "B03", "B04"]).unwrap()
    }

    #[test]
    fn input_without_units() {
        assert_eq!(rgb_input().render(), r#"{bands: ["B02","B03","B04"]}"#);
    }

    #[test]
    fn input_with_scalar_and_per_band_units() {
        let scalar = rgb_input().with_units("DN");
        assert_eq!(scalar.render(), r#"{bands: ["B02","B03","B04"], units: "DN"}"#);

        let per_band = InputSpec::new(["B04", "dataMask"])
            .unwrap()
            .with_units(vec!["REFLECTANCE".to_owned(), "DN".to_owned()]);
        assert_eq!(
            per_band.render(),
            r#"{bands: ["B04","dataMask"], units: ["REFLECTANCE","DN"]}"#
        );
    }

    #[test]
    fn mismatched_units_length_is_accepted() {
        let input = rgb_input().with_units(vec!["DN".to_owned()]);
        assert_eq!(input.units(), Some(&Units::PerBand(vec!["DN".to_owned()])));
    }

    #[test]
    fn empty_bands_rejected() {
        let err = InputSpec::new(Vec::<String>::new()).unwrap_err();
        assert_eq!(err, ValidationError::missing("bands"));
    }

    #[test]
    fn zero_output_bands_rejected() {
        let err = OutputSpec::new(0).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "bands"));
    }

    #[test]
    fn single_output_omits_default_id() {
        let out = OutputSpec::new(3).unwrap();
        assert_eq!(out.render(false), r#"{bands: 3, sampleType: "AUTO"}"#);
        let named = out.with_id("rgb").unwrap();
        assert_eq!(named.render(false), r#"{id: "rgb", bands: 3, sampleType: "AUTO"}"#);
    }

    #[test]
    fn list_output_always_has_id() {
        let out = OutputSpec::new(1).unwrap().with_sample_type(None);
        assert_eq!(out.render(true), r#"{id: "default", bands: 1}"#);
    }

    #[test]
    fn zero_nodata_is_emitted() {
        let out = OutputSpec::new(1)
            .unwrap()
            .with_sample_type(Some(SampleType::Float32))
            .with_nodata_value(Some(0.0))
            .unwrap();
        assert_eq!(out.render(false), r#"{bands: 1, sampleType: "FLOAT32", nodataValue: 0}"#);

        let out = out.with_nodata_value(Some(-9999.5)).unwrap();
        assert!(out.render(false).ends_with("nodataValue: -9999.5}"));
    }

    #[test]
    fn non_finite_nodata_rejected() {
        let err = OutputSpec::new(1).unwrap().with_nodata_value(Some(f64::NAN)).unwrap_err();
        assert_eq!(err.field(), "nodataValue");
    }

    #[test]
    fn empty_output_id_rejected() {
        let err = OutputSpec::new(1).unwrap().with_id("").unwrap_err();
        assert_eq!(err.field(), "id");
    }

    #[test]
    fn keywords_parse_case_insensitively() {
        assert_eq!("uint16".parse::<SampleType>().unwrap(), SampleType::Uint16);
        assert_eq!("Orbit".parse::<MosaickingMode>().unwrap(), MosaickingMode::Orbit);
        assert_eq!("BYTE".parse::<SampleType>().unwrap_err().field(), "sampleType");
        assert_eq!("MOSAIC".parse::<MosaickingMode>().unwrap_err().field(), "mosaicking");
    }

    #[test]
    fn setup_requires_inputs_and_outputs() {
        let err = SetupSpec::new(vec![], OutputSpec::new(1).unwrap()).unwrap_err();
        assert_eq!(err, ValidationError::missing("input"));

        let err = SetupSpec::new(vec![rgb_input()], Vec::<OutputSpec>::new()).unwrap_err();
        assert_eq!(err, ValidationError::missing("output"));
    }

    #[test]
    fn setup_block_layout() {
        let setup = SetupSpec::new(
            vec![rgb_input().with_units("DN")],
            OutputSpec::new(3).unwrap().with_sample_type(Some(SampleType::Uint8)),
        )
        .unwrap();
        assert_eq!(
            setup.render(),
            concat!(
                "function setup() {\n",
                "    return {\n",
                "        input: [{bands: [\"B02\",\"B03\",\"B04\"], units: \"DN\"}],\n",
                "        output: {bands: 3, sampleType: \"UINT8\"},\n",
                "        mosaicking: \"SIMPLE\"\n",
                "    };\n",
                "}\n",
            )
        );
    }

    #[test]
    fn cleared_mosaicking_leaves_no_comma() {
        let setup = SetupSpec::new(vec![rgb_input()], OutputSpec::new(3).unwrap())
            .unwrap()
            .with_mosaicking(None);
        let rendered = setup.render();
        assert!(rendered.contains("        output: {bands: 3, sampleType: \"AUTO\"}\n    };\n"));
        assert!(!rendered.contains("mosaicking"));
    }

    #[test]
    fn multiple_inputs_keep_declaration_order() {
        let setup = SetupSpec::new(
            vec![
                InputSpec::new(["B08"]).unwrap(),
                InputSpec::new(["dataMask"]).unwrap(),
            ],
            vec![
                OutputSpec::new(1).unwrap(),
                OutputSpec::new(1).unwrap().with_id("mask").unwrap(),
            ],
        )
        .unwrap()
        .with_mosaicking(Some(MosaickingMode::Orbit));
        let rendered = setup.render();
        assert!(rendered.contains(r#"input: [{bands: ["B08"]}, {bands: ["dataMask"]}],"#));
        assert!(rendered.contains(
            r#"output: [{id: "default", bands: 1, sampleType: "AUTO"}, {id: "mask", bands: 1, sampleType: "AUTO"}],"#
        ));
        assert!(rendered.contains("mosaicking: \"ORBIT\"\n"));
    }
}
