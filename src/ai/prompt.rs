//! System prompts for the three flows.
//!
//! Each prompt ends with the exact JSON shape the reply must take, which is
//! what [`super::client`] parses.

// ---------------------------------------------------------------------------
// System instructions
// ---------------------------------------------------------------------------

const SUMMARY_INSTRUCTION: &str = "\
You are an expert summarizer.

You will be provided with the content of a PDF document.
Your task is to create a concise summary of the document's main points.

Reply with a JSON object of the form {\"summary\": \"<summary>\"} and nothing else.";

const SPEECH_TEXT_INSTRUCTION: &str = "\
You are an AI assistant specialized in extracting text from PDF documents for text-to-speech conversion.

Extract all the text content from the provided PDF document, in reading order.
Leave out page numbers, running headers and footers.

Reply with a JSON object of the form {\"speechText\": \"<text>\"} and nothing else.";

const OBJECT_DETECTION_INSTRUCTION: &str = "\
You are an expert AI object detection specialist.

You will analyze the photo provided and identify the objects present in the image.

Reply with a JSON object of the form {\"objects\": [\"<object>\", ...]} and nothing else.";

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

/// Identifies a flow; selects its prompt and the user message that carries
/// the media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Summary,
    SpeechText,
    ObjectDetection,
}

impl Flow {
    /// Name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Flow::Summary => "pdf-summary",
            Flow::SpeechText => "pdf-text-to-speech",
            Flow::ObjectDetection => "photo-object-detection",
        }
    }

    /// The system message for this flow.
    pub fn system_instruction(self) -> &'static str {
        match self {
            Flow::Summary => SUMMARY_INSTRUCTION,
            Flow::SpeechText => SPEECH_TEXT_INSTRUCTION,
            Flow::ObjectDetection => OBJECT_DETECTION_INSTRUCTION,
        }
    }

    /// The text placed next to the media in the user message.
    pub fn user_text(self) -> &'static str {
        match self {
            Flow::Summary => "Use the following PDF content:",
            Flow::SpeechText => "PDF Content:",
            Flow::ObjectDetection => "Photo:",
        }
    }
}
