pub mod elevenlabs;
pub mod gemini;
pub mod pollinations;
pub mod socialverse;
