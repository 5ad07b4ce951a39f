use serde::Deserialize;

use crate::{AppError, AppResult, tokens::TokenCounter};

pub const MAX_NAME_CHARS: usize = 30;
pub const MAX_DESCRIPTION_CHARS: usize = 100;
pub const MAX_MODEL_CHARS: usize = 50;
pub const MAX_PROMPT_CHARS: usize = 10_000;
pub const MAX_PROMPT_TOKENS: usize = 2048;
pub const MAX_INIT_MESSAGE_CHARS: usize = 1000;
pub const MAX_CONTEXT: i64 = 30;

/// Room fields submitted on create and update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoomRequest {
    pub avatar_id: i64,
    pub avatar_url: String,
    pub name: String,
    pub description: String,
    pub model: String,
    pub vendor: String,
    pub system_prompt: String,
    pub init_message: String,
    pub max_context: i64,
}

fn chars(s: &str) -> usize {
    s.chars().count()
}

pub(crate) fn check_max_context(max_context: i64) -> AppResult<()> {
    if !(0..=MAX_CONTEXT).contains(&max_context) {
        return Err(AppError::validation(format!(
            "max context must be between 0 and {MAX_CONTEXT}, 0 uses the default"
        )));
    }
    Ok(())
}

impl RoomRequest {
    /// Checks field limits and normalizes the request.
    ///
    /// A blank model becomes `default_model`. An avatar url, when given, wins
    /// over an avatar id. The token limit on the system prompt is only
    /// enforced when `tokens` can count it.
    pub(crate) fn validate(mut self, default_model: &str, tokens: &dyn TokenCounter) -> AppResult<Self> {
        check_max_context(self.max_context)?;

        if chars(&self.init_message) > MAX_INIT_MESSAGE_CHARS {
            return Err(AppError::validation(format!(
                "init message must not exceed {MAX_INIT_MESSAGE_CHARS} characters"
            )));
        }

        if self.name.is_empty() {
            return Err(AppError::validation("room name is required"));
        }

        if chars(&self.name) > MAX_NAME_CHARS {
            return Err(AppError::validation(format!(
                "room name must not exceed {MAX_NAME_CHARS} characters"
            )));
        }

        if chars(&self.description) > MAX_DESCRIPTION_CHARS {
            return Err(AppError::validation(format!(
                "description must not exceed {MAX_DESCRIPTION_CHARS} characters"
            )));
        }

        if chars(&self.model) > MAX_MODEL_CHARS {
            return Err(AppError::validation("malformed model"));
        }

        if self.model.is_empty() {
            self.model = default_model.to_owned();
        }

        if chars(&self.system_prompt) > MAX_PROMPT_CHARS {
            return Err(AppError::validation(format!(
                "system prompt must not exceed {MAX_PROMPT_CHARS} characters"
            )));
        }

        match tokens.count(&self.system_prompt, &self.model) {
            Ok(count) if count > MAX_PROMPT_TOKENS => {
                return Err(AppError::validation(format!(
                    "system prompt must not exceed {MAX_PROMPT_TOKENS} tokens"
                )));
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(model = %self.model, "failed to count system prompt tokens: {err}");
            }
        }

        if !self.avatar_url.is_empty() {
            self.avatar_id = 0;
        }

        Ok(self)
    }
}

#[cfg(test)]
pub(crate) struct BrokenCounter;

#[cfg(test)]
impl TokenCounter for BrokenCounter {
    fn count(&self, _text: &str, model: &str) -> anyhow::Result<usize> {
        anyhow::bail!("no tokenizer for {model}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::ApproxTokenCounter;

    fn base() -> RoomRequest {
        RoomRequest {
            name: "Tutor".to_owned(),
            ..Default::default()
        }
    }

    fn validate(req: RoomRequest) -> AppResult<RoomRequest> {
        req.validate("gpt-4o-mini", &ApproxTokenCounter)
    }

    #[test]
    fn blank_model_uses_default() {
        assert_eq!(validate(base()).unwrap().model, "gpt-4o-mini");
    }

    #[test]
    fn max_context_range() {
        for bad in [-1, 31] {
            let req = RoomRequest { max_context: bad, ..base() };
            let err = validate(req).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
            assert_eq!(err.to_string(), "max context must be between 0 and 30, 0 uses the default");
        }
        for ok in [0, 1, 30] {
            let req = RoomRequest { max_context: ok, ..base() };
            assert_eq!(validate(req).unwrap().max_context, ok);
        }
    }

    #[test]
    fn name_limits_count_codepoints() {
        assert!(validate(RoomRequest { name: String::new(), ..base() }).is_err());
        assert!(validate(RoomRequest { name: "字".repeat(30), ..base() }).is_ok());
        assert!(validate(RoomRequest { name: "字".repeat(31), ..base() }).is_err());
    }

    #[test]
    fn text_limits() {
        assert!(validate(RoomRequest { description: "d".repeat(101), ..base() }).is_err());
        assert!(validate(RoomRequest { model: "m".repeat(51), ..base() }).is_err());
        assert!(validate(RoomRequest { init_message: "i".repeat(1001), ..base() }).is_err());
        assert!(validate(RoomRequest { system_prompt: "p".repeat(10_001), ..base() }).is_err());
        assert!(validate(RoomRequest { init_message: "i".repeat(1000), ..base() }).is_ok());
    }

    #[test]
    fn token_limit_applies_when_countable() {
        // 3000 non-ascii chars: fine by length, too many tokens
        let req = RoomRequest { system_prompt: "好".repeat(3000), ..base() };
        assert!(matches!(validate(req.clone()), Err(AppError::Validation(_))));

        // counter failure only logs
        assert!(req.validate("gpt-4o-mini", &BrokenCounter).is_ok());
    }

    #[test]
    fn avatar_url_discards_avatar_id() {
        let req = RoomRequest {
            avatar_id: 4,
            avatar_url: "https://img.example.com/a.png".to_owned(),
            ..base()
        };
        let req = validate(req).unwrap();
        assert_eq!(req.avatar_id, 0);

        let req = validate(RoomRequest { avatar_id: 4, ..base() }).unwrap();
        assert_eq!(req.avatar_id, 4);
    }
}
