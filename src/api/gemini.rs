use crate::config::Config;
use crate::error::{Phase, PipelineError, Result};
use reqwest::Client;
use serde_json::json;

const GENERATE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

async fn generate_text(client: &Client, cfg: &Config, prompt: &str) -> Result<String> {
    let body = json!({
        "contents": [
            {"parts": [{"text": prompt}]}
        ]
    });

    let resp = client
        .post(GENERATE_URL)
        .query(&[("key", cfg.gemini_key.as_str())])
        .json(&body)
        .timeout(std::time::Duration::from_secs(120))
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(PipelineError::from_response(Phase::PromptGeneration, resp).await);
    }

    let root: serde_json::Value = resp.json().await?;
    let text = root["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or(PipelineError::ResponseShape(
            "no candidates[0].content.parts[0].text in generation response",
        ))?;

    Ok(text.to_string())
}

/// Asks the model for five storyline image prompts and one combined
/// narration, in the literal shape the prompt parser expects.
pub async fn generate_prompts(client: &Client, cfg: &Config, topic: &str) -> Result<String> {
    let prompt = format!(
        "Create 5 prompts for images according to the topic I give you, forming a realistic \
         and relatable storyline. Then create one long narration text that fits all the images \
         combined, motivating, cheering up or calming. The topic is \"{topic}\". \
         Do not number the narration or mention the images in it, and do not include anything \
         in brackets or pauses, just a smooth narration. \
         Answer with exactly two lines:\n\
         image_prompts = [\"...\", \"...\", \"...\", \"...\", \"...\"]\n\
         audio_prompt = \"...\""
    );
    generate_text(client, cfg, &prompt).await
}

/// Asks the model for a single-word hashtag for the topic, then sanitizes
/// the answer. The model regularly ignores the one-word instruction, so the
/// reply is reduced to its first token with punctuation stripped rather
/// than trusted as-is.
pub async fn generate_hashtag(client: &Client, cfg: &Config, topic: &str) -> Result<String> {
    let prompt = format!(
        "Create one most relevant hashtag for the following topic: '{topic}' which cheers me \
         up or motivates or calms me down. Answer with only one word."
    );
    let raw = generate_text(client, cfg, &prompt).await?;
    Ok(sanitize_hashtag(&raw))
}

pub fn sanitize_hashtag(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('#')
        .split_whitespace()
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::sanitize_hashtag;

    #[test]
    fn strips_leading_hash_and_whitespace() {
        assert_eq!(sanitize_hashtag("  #motivation \n"), "motivation");
    }

    #[test]
    fn takes_first_token_of_multi_word_reply() {
        assert_eq!(sanitize_hashtag("#keepgoing you've got this!"), "keepgoing");
    }

    #[test]
    fn drops_punctuation() {
        assert_eq!(sanitize_hashtag("#self-care."), "selfcare");
    }

    #[test]
    fn empty_reply_stays_empty() {
        assert_eq!(sanitize_hashtag("   "), "");
    }
}
