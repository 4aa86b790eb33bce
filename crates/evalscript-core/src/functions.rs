// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Script bodies for the four pipeline hooks the service invokes.
//!
//! Bodies are opaque: they are inserted between the signature's braces
//! verbatim, without parsing, escaping or validation.

use crate::error::ValidationError;

/// Signature of the scene pre-processing hook.
pub const PRE_PROCESS_SCENES_SIGNATURE: &str = "function preProcessScenes(collections)";
/// Signature of the per-pixel evaluation hook.
pub const EVALUATE_PIXEL_SIGNATURE: &str =
    "function evaluatePixel(samples, scenes, inputMetadata, customData, outputMetadata)";
/// Signature of the output update hook.
pub const UPDATE_OUTPUT_SIGNATURE: &str = "function updateOutput(output, collection)";
/// Signature of the output metadata update hook.
pub const UPDATE_OUTPUT_METADATA_SIGNATURE: &str =
    "function updateOutputMetadata(scenes, inputMetadata, outputMetadata)";

/// Hook bodies; `evaluatePixel` is mandatory, the rest are optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBlocks {
    pre_process_scenes: Option<String>,
    evaluate_pixel: String,
    update_output: Option<String>,
    update_output_metadata: Option<String>,
}

impl FunctionBlocks {
    /// Create blocks with only the required `evaluatePixel` body.
    pub fn new(evaluate_pixel: impl Into<String>) -> Result<Self, ValidationError> {
        let evaluate_pixel = evaluate_pixel.into();
        if evaluate_pixel.is_empty() {
            return Err(ValidationError::missing("evaluatePixel"));
        }
        Ok(Self {
            pre_process_scenes: None,
            evaluate_pixel,
            update_output: None,
            update_output_metadata: None,
        })
    }

    /// Set the `preProcessScenes` body. An empty body counts as absent.
    #[must_use]
    pub fn with_pre_process_scenes(mut self, body: impl Into<String>) -> Self {
        self.pre_process_scenes = present(body.into());
        self
    }

    /// Set the `updateOutput` body. An empty body counts as absent.
    #[must_use]
    pub fn with_update_output(mut self, body: impl Into<String>) -> Self {
        self.update_output = present(body.into());
        self
    }

    /// Set the `updateOutputMetadata` body. An empty body counts as absent.
    #[must_use]
    pub fn with_update_output_metadata(mut self, body: impl Into<String>) -> Self {
        self.update_output_metadata = present(body.into());
        self
    }

    /// `preProcessScenes` body, if any.
    pub fn pre_process_scenes(&self) -> Option<&str> {
        self.pre_process_scenes.as_deref()
    }

    /// `evaluatePixel` body.
    pub fn evaluate_pixel(&self) -> &str {
        &self.evaluate_pixel
    }

    /// `updateOutput` body, if any.
    pub fn update_output(&self) -> Option<&str> {
        self.update_output.as_deref()
    }

    /// `updateOutputMetadata` body, if any.
    pub fn update_output_metadata(&self) -> Option<&str> {
        self.update_output_metadata.as_deref()
    }

    /// `preProcessScenes` block, or `""` when there is no body.
    pub fn render_pre_process_scenes(&self) -> String {
        render_optional(PRE_PROCESS_SCENES_SIGNATURE, self.pre_process_scenes.as_deref())
    }

    /// `evaluatePixel` block. Always present.
    pub fn render_evaluate_pixel(&self) -> String {
        render_block(EVALUATE_PIXEL_SIGNATURE, &self.evaluate_pixel)
    }

    /// `updateOutput` block, or `""` when there is no body.
    pub fn render_update_output(&self) -> String {
        render_optional(UPDATE_OUTPUT_SIGNATURE, self.update_output.as_deref())
    }

    /// `updateOutputMetadata` block, or `""` when there is no body.
    pub fn render_update_output_metadata(&self) -> String {
        render_optional(
            UPDATE_OUTPUT_METADATA_SIGNATURE,
            self.update_output_metadata.as_deref(),
        )
    }
}

fn present(body: String) -> Option<String> {
    (!body.is_empty()).then_some(body)
}

fn render_block(signature: &str, body: &str) -> String {
    format!("{signature} {{\n{body}\n}}\n")
}

fn render_optional(signature: &str, body: Option<&str>) -> String {
    body.map(|body| render_block(signature, body)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    use super::*;

    #[test]
    fn evaluate_pixel_is_required() {
        assert_eq!(
            FunctionBlocks::new("").unwrap_err(),
            ValidationError::missing("evaluatePixel")
        );
    }

    #[test]
    fn evaluate_pixel_wraps_body_verbatim() {
        let blocks = FunctionBlocks::new("return [samples.B02];").unwrap();
        assert_eq!(
            blocks.render_evaluate_pixel(),
            "function evaluatePixel(samples, scenes, inputMetadata, customData, outputMetadata) {\nreturn [samples.B02];\n}\n"
        );
    }

    #[test]
    fn absent_optional_blocks_render_empty() {
        let blocks = FunctionBlocks::new("return [1];").unwrap();
        assert_eq!(blocks.render_pre_process_scenes(), "");
        assert_eq!(blocks.render_update_output(), "");
        assert_eq!(blocks.render_update_output_metadata(), "");
    }

    #[test]
    fn empty_optional_body_counts_as_absent() {
        let blocks = FunctionBlocks::new("return [1];")
            .unwrap()
            .with_update_output("");
        assert_eq!(blocks.update_output(), None);
        assert_eq!(blocks.render_update_output(), "");
    }

    #[test]
    fn optional_blocks_use_their_signatures() {
        let blocks = FunctionBlocks::new("return [1];")
            .unwrap()
            .with_pre_process_scenes("return collections;")
            .with_update_output("output.default.bands = 1;")
            .with_update_output_metadata("outputMetadata.userData = {};");
        assert_eq!(
            blocks.render_pre_process_scenes(),
            "function preProcessScenes(collections) {\nreturn collections;\n}\n"
        );
        assert_eq!(
            blocks.render_update_output(),
            "function updateOutput(output, collection) {\noutput.default.bands = 1;\n}\n"
        );
        assert_eq!(
            blocks.render_update_output_metadata(),
            "function updateOutputMetadata(scenes, inputMetadata, outputMetadata) {\noutputMetadata.userData = {};\n}\n"
        );
    }

    #[test]
    fn malformed_bodies_pass_through() {
        let body = "return [samples.B02 ;; }{ \"unterminated";
        let blocks = FunctionBlocks::new(body).unwrap();
        assert!(blocks.render_evaluate_pixel().contains(body));
    }
}
