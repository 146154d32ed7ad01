use super::TranslationRequest;

/// Build the full Persian translation prompt for one cue.
///
/// Context lines are cut to the request's window here, so callers may pass
/// more neighbours than needed.
pub fn build_translation_prompt(request: &TranslationRequest) -> String {
    let preceding = join_or(request.bounded_preceding(), "(No previous lines for context)");
    let following = join_or(request.bounded_following(), "(No following lines for context)");

    format!(
        "{instruction} Your task is to translate the **MAIN_TEXT** from its original language into fluent, accurate, and natural-sounding Persian.\n\
         Use the **PREVIOUS_LINES** and **FOLLOWING_LINES** provided below strictly for contextual understanding to improve the translation of the **MAIN_TEXT**.\n\
         Do NOT translate the PREVIOUS_LINES or FOLLOWING_LINES themselves.\n\
         Only provide the Persian translation for the **MAIN_TEXT**. Output only the translated text, with no extra commentary or labels.\n\
         \n\
         **PREVIOUS_LINES:**\n\
         {preceding}\n\
         \n\
         **MAIN_TEXT:**\n\
         {main_text}\n\
         \n\
         **FOLLOWING_LINES:**\n\
         {following}\n\
         \n\
         Persian Translation of MAIN_TEXT:\n",
        instruction = request.subject.instruction(),
        main_text = request.main_text,
    )
}

fn join_or(lines: &[String], placeholder: &str) -> String {
    if lines.is_empty() {
        placeholder.to_string()
    } else {
        lines.join("\n")
    }
}
