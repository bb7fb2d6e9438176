//! Prompt templates for the material pipeline stages.

/// System context shared by the generation stages.
pub const STUDY_ASSISTANT_SYSTEM: &str =
    "You are a study assistant that processes learning material accurately and concisely.";

/// Build the text-extraction prompt for a raw upload.
pub fn extraction_prompt(raw_content: &str) -> String {
    format!(
        "Extract the key educational text from the following material. \
         Remove boilerplate, navigation fragments, and formatting artifacts. \
         Return only the cleaned text.\n\n{raw_content}"
    )
}

/// Build the content-analysis prompt for extracted text.
///
/// The model must answer with a single JSON object; the caller validates the
/// shape strictly and treats anything else as a parse failure.
pub fn analysis_prompt(text: &str) -> String {
    format!(
        "Analyze the following study material and respond with a single JSON \
         object with exactly these fields: \
         \"topics\" (array of strings), \
         \"summary\" (string), \
         \"key_points\" (array of strings), \
         \"difficulty_level\" (string), \
         \"prerequisites\" (array of strings), \
         \"related_topics\" (array of strings). \
         Respond with the JSON object only, no prose.\n\n{text}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_embeds_the_content() {
        let prompt = extraction_prompt("mitochondria notes");
        assert!(prompt.contains("mitochondria notes"));
        assert!(prompt.contains("Extract"));
    }

    #[test]
    fn analysis_prompt_names_every_field() {
        let prompt = analysis_prompt("text");
        for field in [
            "topics",
            "summary",
            "key_points",
            "difficulty_level",
            "prerequisites",
            "related_topics",
        ] {
            assert!(prompt.contains(field), "missing field {field}");
        }
    }
}
