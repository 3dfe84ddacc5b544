//! Fixed prompt tables for handwriting extraction and text transforms.
//!
//! Plain immutable lookups resolved per request. Unknown or missing language
//! hints fall back to the `auto` entry.

/// Language-hint extraction prompts, keyed by hint code.
pub const LANGUAGE_PROMPTS: &[(&str, &str)] = &[
    (
        "auto",
        "You are an expert at reading handwriting. Extract all handwritten text \
         from this image. Detect the language automatically and transcribe the \
         text exactly as written, preserving line breaks and paragraph structure. \
         Return only the transcribed text, with no commentary.",
    ),
    (
        "en",
        "You are an expert at reading handwriting. Extract all handwritten text \
         from this image. The text is written in English. Transcribe it exactly \
         as written, preserving line breaks and paragraph structure. Return only \
         the transcribed text, with no commentary.",
    ),
    (
        "hi",
        "You are an expert at reading handwriting. Extract all handwritten text \
         from this image. The text is written in Hindi, in Devanagari script. \
         Transcribe it in Devanagari exactly as written, preserving line breaks \
         and paragraph structure. Return only the transcribed text, with no \
         commentary.",
    ),
    (
        "mr",
        "You are an expert at reading handwriting. Extract all handwritten text \
         from this image. The text is written in Marathi, in Devanagari script. \
         Transcribe it in Devanagari exactly as written, preserving line breaks \
         and paragraph structure. Return only the transcribed text, with no \
         commentary.",
    ),
    (
        "es",
        "You are an expert at reading handwriting. Extract all handwritten text \
         from this image. The text is written in Spanish. Transcribe it exactly \
         as written, preserving accents, line breaks and paragraph structure. \
         Return only the transcribed text, with no commentary.",
    ),
];

/// Resolve the extraction prompt for a language hint.
pub fn extraction_prompt(hint: Option<&str>) -> &'static str {
    let hint = hint.unwrap_or("auto");
    LANGUAGE_PROMPTS
        .iter()
        .find(|(code, _)| *code == hint)
        .or_else(|| LANGUAGE_PROMPTS.iter().find(|(code, _)| *code == "auto"))
        .map(|(_, prompt)| *prompt)
        .unwrap_or_default()
}

/// Text transform requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Summarize,
    Rewrite,
}

impl Mode {
    /// Parse the wire value; anything outside the two modes is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "summarize" => Some(Self::Summarize),
            "rewrite" => Some(Self::Rewrite),
            _ => None,
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            Self::Summarize => {
                "Summarize the following text into a short, clear paragraph that \
                 keeps every key point. Return only the summary, with no commentary:"
            }
            Self::Rewrite => {
                "Rewrite the following text with improved clarity, grammar and flow, \
                 preserving its meaning and tone. Return only the rewritten text, \
                 with no commentary:"
            }
        }
    }
}

/// Build the full transform prompt: mode instruction, blank line, input text.
pub fn transform_prompt(mode: Mode, text: &str) -> String {
    format!("{}\n\n{}", mode.instruction(), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_hints_resolve() {
        for &(code, prompt) in LANGUAGE_PROMPTS {
            assert_eq!(extraction_prompt(Some(code)), prompt);
        }
    }

    #[test]
    fn test_unknown_hint_falls_back_to_auto() {
        let auto = extraction_prompt(Some("auto"));
        assert_eq!(extraction_prompt(Some("fr")), auto);
        assert_eq!(extraction_prompt(Some("")), auto);
        assert_eq!(extraction_prompt(None), auto);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("summarize"), Some(Mode::Summarize));
        assert_eq!(Mode::parse("rewrite"), Some(Mode::Rewrite));
        assert_eq!(Mode::parse("translate"), None);
        assert_eq!(Mode::parse("Summarize"), None);
        assert_eq!(Mode::parse(""), None);
    }

    #[test]
    fn test_transform_prompt_concatenates_text() {
        let prompt = transform_prompt(Mode::Rewrite, "long passage");
        assert!(prompt.starts_with("Rewrite the following text"));
        assert!(prompt.ends_with("\n\nlong passage"));
    }
}
