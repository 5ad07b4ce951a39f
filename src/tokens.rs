/// Counts model tokens in a piece of text.
///
/// Counting is best-effort: callers treat an error as "unknown" and carry on.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str, model: &str) -> anyhow::Result<usize>;
}

/// Rough estimate for deployments without a real tokenizer: one token per
/// four ASCII bytes and one per non-ASCII character.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTokenCounter;

impl TokenCounter for ApproxTokenCounter {
    fn count(&self, text: &str, _model: &str) -> anyhow::Result<usize> {
        let (ascii, other) = text.chars().fold((0usize, 0usize), |(a, o), c| {
            if c.is_ascii() { (a + 1, o) } else { (a, o + 1) }
        });
        Ok(ascii.div_ceil(4) + other)
    }
}
