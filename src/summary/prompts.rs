//! Prompt template for place narration

use crate::location::Place;

/// Instructions prepended to every narration request
pub const TOUR_GUIDE_PROMPT: &str = "You are an expert tour guide. Speak as an authority on the subject. \
Do not ask the user for clarifications or questions.";

/// Build the prompt asking for something interesting about `place`
pub fn narration_prompt(place: &Place) -> String {
    format!(
        "{} Tell me something interesting about {}.",
        TOUR_GUIDE_PROMPT, place
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_place() {
        let prompt = narration_prompt(&Place::new("Paris, France"));
        assert!(prompt.starts_with("You are an expert tour guide."));
        assert!(prompt.ends_with("Tell me something interesting about Paris, France."));
    }

    #[test]
    fn test_prompt_forbids_questions() {
        let prompt = narration_prompt(&Place::new("Hobart"));
        assert!(prompt.contains("Do not ask the user for clarifications or questions."));
    }
}
