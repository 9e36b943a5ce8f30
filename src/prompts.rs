use once_cell::sync::Lazy;
use regex::Regex;

/// Ordered image descriptions plus the combined narration text recovered
/// from one model response. Consumed immediately; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptSet {
    pub image_prompts: Vec<String>,
    pub narration: String,
}

impl PromptSet {
    pub fn is_empty(&self) -> bool {
        self.image_prompts.is_empty() || self.narration.is_empty()
    }
}

static IMAGE_PROMPTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)image_prompts\s*=\s*\[(.*?)\]").unwrap());

static AUDIO_PROMPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)audio_prompt\s*=\s*"((?:[^"\\]|\\.)*)""#).unwrap());

/// Extracts the prompt set from free-form model output.
///
/// The response is expected to embed two literal patterns:
/// `image_prompts = [...]` and `audio_prompt = "..."`. The bracket body is
/// parsed by a small tokenizer over comma-separated quoted strings; model
/// output is never evaluated as code. If either pattern is missing, both
/// outputs come back empty and the caller decides what to do about it.
pub fn parse_prompt_set(response: &str) -> PromptSet {
    let images = IMAGE_PROMPTS_RE.captures(response);
    let audio = AUDIO_PROMPT_RE.captures(response);

    match (images, audio) {
        (Some(images), Some(audio)) => PromptSet {
            image_prompts: parse_quoted_list(&images[1]),
            narration: unescape(audio[1].trim()),
        },
        _ => PromptSet::default(),
    }
}

/// Parses a comma-separated sequence of quoted strings ("..." or '...'),
/// honoring `\"` and `\\` escapes. Anything between closing and opening
/// quotes (commas, whitespace, stray text) is skipped.
fn parse_quoted_list(body: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut chars = body.chars();

    while let Some(ch) = chars.next() {
        let quote = match ch {
            '"' | '\'' => ch,
            _ => continue,
        };

        let mut item = String::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some(esc) => item.push(unescape_char(esc)),
                    None => break,
                }
            } else if c == quote {
                closed = true;
                break;
            } else {
                item.push(c);
            }
        }

        // An unterminated final quote is dropped rather than guessed at.
        if closed {
            items.push(item);
        }
    }

    items
}

fn unescape_char(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        other => other,
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(esc) => out.push(unescape_char(esc)),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Splits text into fixed-size character windows. Not sentence- or
/// word-aware; mid-word splits are accepted. Concatenating the chunks
/// reproduces the input exactly.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::with_capacity(max_chars);
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == max_chars {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"Sure! Here are your prompts:

image_prompts = ["a sunrise over a misty valley", "a climber midway up a cliff", "a summit view at golden hour"]
audio_prompt = "Every journey begins with a single step. Keep climbing."
"#;

    #[test]
    fn parses_prompts_and_narration() {
        let set = parse_prompt_set(RESPONSE);
        assert_eq!(
            set.image_prompts,
            vec![
                "a sunrise over a misty valley",
                "a climber midway up a cliff",
                "a summit view at golden hour",
            ]
        );
        assert_eq!(
            set.narration,
            "Every journey begins with a single step. Keep climbing."
        );
    }

    #[test]
    fn preserves_prompt_order() {
        let text = r#"image_prompts = ["one", "two", "three", "four", "five"]
audio_prompt = "counting up""#;
        let set = parse_prompt_set(text);
        assert_eq!(set.image_prompts, vec!["one", "two", "three", "four", "five"]);
    }

    #[test]
    fn handles_escaped_quotes() {
        let text = r#"image_prompts = ["a sign reading \"keep going\"", "calm water"]
audio_prompt = "She whispered \"you can do this\" and smiled.""#;
        let set = parse_prompt_set(text);
        assert_eq!(set.image_prompts[0], "a sign reading \"keep going\"");
        assert_eq!(
            set.narration,
            "She whispered \"you can do this\" and smiled."
        );
    }

    #[test]
    fn accepts_single_quoted_items() {
        let text = r#"image_prompts = ['a quiet library', 'an open book']
audio_prompt = "read on""#;
        let set = parse_prompt_set(text);
        assert_eq!(set.image_prompts, vec!["a quiet library", "an open book"]);
    }

    #[test]
    fn missing_image_pattern_yields_empty() {
        let set = parse_prompt_set(r#"audio_prompt = "alone""#);
        assert!(set.image_prompts.is_empty());
        assert!(set.narration.is_empty());
    }

    #[test]
    fn missing_audio_pattern_yields_empty() {
        let set = parse_prompt_set(r#"image_prompts = ["a", "b"]"#);
        assert!(set.image_prompts.is_empty());
        assert!(set.narration.is_empty());
    }

    #[test]
    fn garbage_response_yields_empty() {
        let set = parse_prompt_set("I'm sorry, I can't help with that.");
        assert!(set.is_empty());
    }

    #[test]
    fn unterminated_quote_is_dropped() {
        let items = parse_quoted_list(r#""complete", "dangling"#);
        assert_eq!(items, vec!["complete"]);
    }

    #[test]
    fn chunk_count_matches_ceiling() {
        let text = "x".repeat(1801);
        let chunks = chunk_text(&text, 600);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.chars().count() <= 600));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn chunk_exact_multiple() {
        let text = "y".repeat(1200);
        let chunks = chunk_text(&text, 600);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn chunk_short_text_is_single_chunk() {
        let chunks = chunk_text("short", 600);
        assert_eq!(chunks, vec!["short"]);
    }

    #[test]
    fn chunk_empty_text() {
        assert!(chunk_text("", 600).is_empty());
    }

    #[test]
    fn chunk_counts_chars_not_bytes() {
        let text = "é".repeat(601);
        let chunks = chunk_text(&text, 600);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 600);
        assert_eq!(chunks.concat(), text);
    }
}
