// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed evalscript (VERSION=3) configuration and renderer.
//!
//! A [`SetupSpec`] describes the `setup()` return object, a [`FunctionBlocks`]
//! holds the hook bodies, and [`EvalScript`] assembles both into program text:
//!
//! ```
//! use evalscript_core::{EvalScript, FunctionBlocks, InputSpec, OutputSpec, SampleType, SetupSpec};
//!
//! # fn main() -> Result<(), evalscript_core::ValidationError> {
//! let setup = SetupSpec::new(
//!     vec![InputSpec::new(["B02", "B03", "B04"])?.with_units("DN")],
//!     OutputSpec::new(3)?.with_sample_type(Some(SampleType::Uint8)),
//! )?;
//! let functions = FunctionBlocks::new("return [samples.B04, samples.B03, samples.B02];")?;
//! let script = EvalScript::new(setup, functions).render();
//! assert!(script.starts_with("//VERSION=3\n"));
//! # Ok(())
//! # }
//! ```
//!
//! Everything here is plain data and pure string formatting: validation runs
//! when values are constructed and rendering cannot fail. Hook bodies and
//! string values are embedded verbatim; the caller owns their content.

pub mod document;
pub mod error;
pub mod extract;
pub mod functions;
pub mod program;
pub mod setup;

pub use document::{DocumentError, DocumentFormat, EvalScriptDoc};
pub use error::ValidationError;
pub use extract::{extract_fenced_script, has_version_header};
pub use functions::FunctionBlocks;
pub use program::{EvalScript, VERSION_HEADER};
pub use setup::{
    InputSpec, MosaickingMode, OutputSpec, Outputs, SampleType, SetupSpec, Units, DEFAULT_OUTPUT_ID,
};
