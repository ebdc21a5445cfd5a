//! Request text sent to the upstream model for each content kind.

/// Characters of notes forwarded to the speech model.
pub const AUDIO_NOTES_LIMIT: usize = 2500;

/// System instruction for the tutor chat.
pub const TUTOR_INSTRUCTION: &str = "You are AceBot, an expert Class 12 AI Tutor. Use Hinglish.";

fn is_maths(subject: &str) -> bool {
    subject.to_lowercase().contains("math")
}

/// Full-chapter study notes.
pub fn notes(subject: &str, chapter: &str) -> String {
    let structure = if is_maths(subject) {
        "Structure each topic as TOPIC, INTRO, FORMULA, EXAMPLE. Write formulas in plain text."
            .to_string()
    } else {
        format!(
            "Cover every {subject} topic in detail using TOPIC:, INTRO:, DEFINITION:, FORMULA: and EXAMPLE: markers."
        )
    };
    format!(
        "You are a Class 12 CBSE educator.\n\
         Subject: {subject}\n\
         Chapter: {chapter}\n\
         Write complete study notes for the board exam.\n\
         Rules:\n\
         1. No LaTeX or special symbols such as $ or backslashes.\n\
         2. {structure}\n\
         3. Include every NCERT topic in the chapter."
    )
}

/// Previous-year style practice questions with worked answers.
pub fn questions(subject: &str, chapter: &str) -> String {
    format!(
        "You are a CBSE exam strategist.\n\
         Subject: {subject}\n\
         Chapter: {chapter}\n\
         List 20 to 25 high-impact board questions, most recent years first, \
         each with a point-wise solution and a [CBSE YEAR] tag. No $ symbols."
    )
}

/// Spoken walkthrough of the notes. Notes are cut to [`AUDIO_NOTES_LIMIT`] characters.
pub fn audio(notes: &str, subject: &str) -> String {
    let excerpt: String = notes.chars().take(AUDIO_NOTES_LIMIT).collect();
    format!(
        "Explain this {subject} chapter in Hinglish, the way a friendly Indian teacher would: {excerpt}"
    )
}

/// Rendered formula image.
pub fn image(description: &str, subject: &str) -> String {
    format!("Sharp black {subject} formula on a plain white background: {description}")
}
