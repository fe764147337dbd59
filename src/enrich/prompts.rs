//! Fixed instructions and request shapes for every AI call the enricher makes.

use crate::ai::CompletionRequest;

pub const DEFAULT_VISION_PROMPT: &str =
    "Describe the objects and setting in the image in a neutral manner.";
pub const NO_REVIEWS: &str = "No reviews available for summarization.";
pub const NO_IMAGES: &str = "No images were analyzed.";

const REVIEW_SYSTEM: &str = "You are a local travel advisor that summarizes customer reviews. \
Summarize the 'review_text' fields in four sentences. \
The summary should be a single paragraph, not in bullet format.";

const VISION_SYSTEM: &str = "You are an AI vision model that analyzes images and provides \
factual descriptions of primary objects, settings, and scenes in four sentences or less, \
without speculation or interpretation.";

const PHOTO_SUMMARY_SYSTEM: &str =
    "You are an AI assistant that creates concise, informative summaries.";

const SAFE_PROMPT_SYSTEM: &str = "You are an AI assistant that reformulates user-provided \
keywords into safe and neutral prompt used by other LLMs for image analysis.";

#[derive(serde::Serialize)]
struct ReviewText<'a> {
    review_text: &'a str,
}

pub fn review_summary(texts: &[&str]) -> CompletionRequest {
    let items: Vec<ReviewText<'_>> = texts
        .iter()
        .map(|t| ReviewText { review_text: t })
        .collect();
    // Serializing a list of plain string structs cannot fail.
    let user = serde_json::to_string_pretty(&items).unwrap_or_default();
    CompletionRequest::new(REVIEW_SYSTEM, user)
        .max_tokens(400)
        .temperature(0.0)
}

pub fn caption(prompt: &str, image_base64: String) -> CompletionRequest {
    CompletionRequest::new(VISION_SYSTEM, prompt)
        .image(image_base64)
        .max_tokens(150)
        .temperature(0.3)
}

pub fn photo_summary(captions: &[&str]) -> CompletionRequest {
    let user = format!(
        "Based on the following {count} image descriptions, create a concise one-paragraph summary \
that captures key themes, settings, and objects across the images:\n\n{joined}\n\n\
Summarize these descriptions in one coherent paragraph:",
        count = captions.len(),
        joined = captions.join("\n\n"),
    );
    CompletionRequest::new(PHOTO_SUMMARY_SYSTEM, user)
        .max_tokens(250)
        .temperature(0.3)
}

pub fn safe_prompt(keywords: &str) -> CompletionRequest {
    let user = format!(
        "Given the following information: {keywords}, create a professional and neutral prompt \
for image analysis. Do not include any potentially sensitive content."
    );
    CompletionRequest::new(SAFE_PROMPT_SYSTEM, user)
        .max_tokens(100)
        .temperature(0.3)
}
