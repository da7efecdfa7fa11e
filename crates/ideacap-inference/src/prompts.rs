//! Prompt templates sent to the completion endpoint.

/// Instruction paired with the image for handwriting transcription.
pub const TRANSCRIBE_INSTRUCTION: &str = "Transcribe all handwritten text in this image, \
keeping the original formatting and line breaks. Return only the recognized text, \
with no explanation, prefix or suffix.";

/// Build the tag recommendation prompt with `content` embedded verbatim.
pub fn tag_prompt(content: &str) -> String {
    format!(
        "Analyze the following idea and return 3-5 relevant tags.\n\
         Tags should cover the topic, the application domain and key characteristics.\n\
         Return JSON only, with nothing else: {{\"tags\": [\"tag1\", \"tag2\", ...]}}\n\
         \n\
         Idea:\n\
         {}",
        content
    )
}
