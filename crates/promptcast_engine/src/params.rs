//! Backend capability dispatch: which argument set a backend accepts.

use serde_json::{json, Value};

/// Argument set sent to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterProfile {
    /// Prompt only. Fast/distilled variants reject the tuning knobs.
    Minimal,
    /// Prompt plus seed, dimensions, guidance scale and step count.
    Full,
}

/// Identifier fragments (lowercase) of backends that take the minimal set.
/// Extend this table to add new categories.
const PROFILE_TABLE: &[(&str, ParameterProfile)] =
    &[("flux.1-schnell", ParameterProfile::Minimal)];

pub fn classify(identifier: &str) -> ParameterProfile {
    let lowered = identifier.to_lowercase();
    PROFILE_TABLE
        .iter()
        .find(|(fragment, _)| lowered.contains(fragment))
        .map(|(_, profile)| *profile)
        .unwrap_or(ParameterProfile::Full)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub guidance_scale: f32,
    pub num_inference_steps: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            seed: 0,
            width: 1024,
            height: 1024,
            guidance_scale: 3.5,
            num_inference_steps: 28,
        }
    }
}

/// Arguments for one backend call, already narrowed to the backend's profile.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub params: Option<GenerationParams>,
}

impl GenerationRequest {
    pub fn for_backend(identifier: &str, prompt: &str, params: &GenerationParams) -> Self {
        let params = match classify(identifier) {
            ParameterProfile::Minimal => None,
            ParameterProfile::Full => Some(params.clone()),
        };
        Self {
            prompt: prompt.to_string(),
            params,
        }
    }

    /// Positional argument list, in the order the `/infer` endpoint expects.
    pub fn data(&self) -> Vec<Value> {
        let mut data = vec![json!(self.prompt)];
        if let Some(params) = &self.params {
            data.extend([
                json!(params.seed),
                json!(params.width),
                json!(params.height),
                json!(params.guidance_scale),
                json!(params.num_inference_steps),
            ]);
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{classify, GenerationParams, GenerationRequest, ParameterProfile};

    #[test]
    fn schnell_variants_are_minimal() {
        assert_eq!(
            classify("black-forest-labs/FLUX.1-schnell"),
            ParameterProfile::Minimal
        );
        assert_eq!(classify("someone/flux.1-SCHNELL-mirror"), ParameterProfile::Minimal);
    }

    #[test]
    fn everything_else_is_full() {
        assert_eq!(
            classify("stabilityai/stable-diffusion-xl-base-1.0"),
            ParameterProfile::Full
        );
        assert_eq!(classify("black-forest-labs/FLUX.1-dev"), ParameterProfile::Full);
    }

    #[test]
    fn minimal_request_sends_only_the_prompt() {
        let request = GenerationRequest::for_backend(
            "black-forest-labs/FLUX.1-schnell",
            "a red fox",
            &GenerationParams::default(),
        );
        assert_eq!(request.params, None);
        assert_eq!(request.data(), vec![json!("a red fox")]);
    }

    #[test]
    fn full_request_uses_documented_defaults() {
        let request = GenerationRequest::for_backend(
            "runwayml/stable-diffusion-v1-5",
            "a red fox",
            &GenerationParams::default(),
        );
        assert_eq!(
            request.data(),
            vec![
                json!("a red fox"),
                json!(0),
                json!(1024),
                json!(1024),
                json!(3.5),
                json!(28)
            ]
        );
    }
}
