use crate::extract::SentenceRecord;

pub const TITLE_MARKER: &str = "[TITLE]";
pub const UNKNOWN_LEVEL: &str =
    "The student's level is unknown, so adjust your corrections and explanations to be clear and helpful.";
const NATIVE_TEXT_HEADER: &str = "The student's native language text for context:";

const INSTRUCTIONS: &str = r#"For each sentence:
- If it's correct, mark it as "perfect": true (omit revised and note)
- If it needs correction, provide the revised sentence and a brief note explaining the fix"#;

const OUTPUT_FORMAT: &str = r#"Respond ONLY with valid JSON in this exact format:
{
  "corrections": [
    {"perfect": true},
    {"perfect": false, "revised": "The corrected sentence here.", "note": "Brief explanation of the fix."}
  ],
  "feedback": "Overall feedback for the student (1-3 sentences). Follow the 'sandwich' pattern."
}"#;

const RULES: &str = r#"Important:
- Include an entry for EVERY sentence, in the same order as listed above
- Do not add an index or id field; the position in the array identifies the sentence
- For perfect sentences: only include "perfect": true (omit revised and note)
- For corrections: set perfect=false and include both revised text and note
- Sentences marked [TITLE] are the post title: correct them as a headline, not as a full sentence, and do not add a final period"#;

const TIPS: &str = r#"Tips:
- Focus on meaning first. If the sentence doesn't make sense, clear that up before worrying about small grammar or spelling issues.
- Correcting every little mistake is like throwing 20 balls at someone at the same time: they catch none. Pick 1-2 patterns to highlight per piece (e.g., articles, verb tense, sentence clarity).
- Ask short questions that guide them: "Do you need *the* here?"; "Is this past or present?". This builds awareness, not dependency.
- Rules leak, patterns stick: a simple set of example sentences in the explanation often teaches faster than a grammar explanation.
- Real communication matters more than hitting every grammar point.
- Use the 'sandwich' pattern for feedback
- Keep notes concise and helpful
- Be encouraging in the overall feedback"#;

/// Build the correction request for one batch of sentences.
///
/// Pure: identical arguments always produce the identical string. A blank
/// `level` or `native_text` counts as absent; otherwise the native text is
/// inserted byte for byte.
pub fn build_prompt(
    sentences: &[SentenceRecord],
    level: Option<&str>,
    native_text: Option<&str>,
) -> String {
    let level = level.map(str::trim).filter(|l| !l.is_empty());
    let native_text = native_text.filter(|t| !t.trim().is_empty());

    let preamble = match level {
        Some(level) => format!(
            "You are an English language teacher helping a {level}-level student improve their writing. \
             Review each sentence and provide corrections and explanations appropriate for {level} level."
        ),
        None => format!(
            "You are an English language teacher helping a student improve their writing. {UNKNOWN_LEVEL} \
             Review each sentence and provide corrections and explanations."
        ),
    };

    let mut sections = vec![preamble];
    if let Some(text) = native_text {
        sections.push(format!("{NATIVE_TEXT_HEADER}\n{text}"));
    }
    sections.push(INSTRUCTIONS.to_string());
    sections.push(format!("Sentences to review:\n{}", numbered_list(sentences)));
    sections.push(OUTPUT_FORMAT.to_string());
    sections.push(RULES.to_string());
    sections.push(TIPS.to_string());

    let mut prompt = sections.join("\n\n");
    prompt.push('\n');
    prompt
}

fn numbered_list(sentences: &[SentenceRecord]) -> String {
    sentences
        .iter()
        .enumerate()
        .map(|(i, s)| {
            if s.is_title {
                format!("{}. {} {}", i + 1, TITLE_MARKER, s.original)
            } else {
                format!("{}. {}", i + 1, s.original)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
