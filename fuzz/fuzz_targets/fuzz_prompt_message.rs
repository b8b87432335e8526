#![no_main]

use std::path::Path;

use deepwalker::domain::{InferenceRequest, PromptSpec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &str)| {
    let (content, path) = data;
    let prompt = PromptSpec::new("fuzz");
    let request = InferenceRequest {
        system_prompt: &prompt,
        file_path: Path::new(path),
        content,
        model: "fuzz-model",
    };
    assert!(request.to_user_message().ends_with(content));
});
