// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Full-program assembly.

use std::fmt;

use tracing::debug;

use crate::functions::FunctionBlocks;
use crate::setup::SetupSpec;

/// First line of every generated script.
pub const VERSION_HEADER: &str = "//VERSION=3";

/// A complete evalscript: setup plus hook bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalScript {
    setup: SetupSpec,
    functions: FunctionBlocks,
}

impl EvalScript {
    /// Pair an already validated setup with its hook bodies.
    pub fn new(setup: SetupSpec, functions: FunctionBlocks) -> Self {
        Self { setup, functions }
    }

    /// Setup portion.
    pub fn setup(&self) -> &SetupSpec {
        &self.setup
    }

    /// Hook bodies.
    pub fn functions(&self) -> &FunctionBlocks {
        &self.functions
    }

    /// Render the program text.
    ///
    /// Order is fixed: header, setup, a blank line, then `preProcessScenes`,
    /// `evaluatePixel`, `updateOutput`, `updateOutputMetadata`. Absent hooks
    /// contribute nothing.
    pub fn render(&self) -> String {
        let script = [
            format!("{VERSION_HEADER}\n"),
            self.setup.render(),
            "\n".to_owned(),
            self.functions.render_pre_process_scenes(),
            self.functions.render_evaluate_pixel(),
            self.functions.render_update_output(),
            self.functions.render_update_output_metadata(),
        ]
        .concat();
        debug!(
            inputs = self.setup.inputs().len(),
            outputs = self.setup.outputs().specs().len(),
            bytes = script.len(),
            "rendered evalscript"
        );
        script
    }
}

impl fmt::Display for EvalScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
