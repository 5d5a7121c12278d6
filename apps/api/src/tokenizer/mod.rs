//! Word-level tokenizer with a process-wide per-model cache.
//!
//! Tokens are runs of word characters or single non-space symbols. Ids are a
//! stable hash folded into a GPT-2 sized vocabulary, so the same token maps
//! to the same id across processes.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub mod handlers;

pub const VOCAB_SIZE: u32 = 50257;
pub const BOS_TOKEN: &str = "<BOS>";
pub const EOS_TOKEN: &str = "<EOS>";
// Reserved at the top of the vocabulary.
const BOS_TOKEN_ID: u32 = VOCAB_SIZE - 2;
const EOS_TOKEN_ID: u32 = VOCAB_SIZE - 1;
const MAX_MODEL_NAME_LEN: usize = 128;

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\w+\b|\S").expect("token pattern is valid")
});

#[derive(Debug, Error, PartialEq)]
pub enum TokenizerError {
    #[error("Invalid model name: '{0}'")]
    InvalidModelName(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpecialTokens {
    pub bos_token: Option<String>,
    pub eos_token: Option<String>,
    pub pad_token: Option<String>,
    pub unk_token: Option<String>,
    pub cls_token: Option<String>,
    pub sep_token: Option<String>,
    pub mask_token: Option<String>,
}

#[derive(Debug)]
pub struct SimpleTokenizer {
    model: String,
    special_tokens: SpecialTokens,
}

impl SimpleTokenizer {
    fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            special_tokens: SpecialTokens {
                bos_token: Some(BOS_TOKEN.to_string()),
                eos_token: Some(EOS_TOKEN.to_string()),
                pad_token: Some("<PAD>".to_string()),
                unk_token: Some("<UNK>".to_string()),
                cls_token: None,
                sep_token: None,
                mask_token: None,
            },
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn special_tokens(&self) -> &SpecialTokens {
        &self.special_tokens
    }

    pub fn tokenize<'t>(&self, text: &'t str) -> Vec<&'t str> {
        TOKEN_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
    }

    /// Tokenizes `text`, wrapping it in BOS/EOS when `add_special_tokens` is set.
    pub fn encode<'t>(&self, text: &'t str, add_special_tokens: bool) -> Vec<&'t str> {
        let tokens = self.tokenize(text);
        if !add_special_tokens {
            return tokens;
        }
        let mut wrapped = Vec::with_capacity(tokens.len() + 2);
        wrapped.push(BOS_TOKEN);
        wrapped.extend(tokens);
        wrapped.push(EOS_TOKEN);
        wrapped
    }

    /// Joins tokens back into text, dropping special tokens. Punctuation
    /// attaches to the preceding token; words are separated by a space.
    pub fn decode(&self, tokens: &[&str]) -> String {
        let mut text = String::new();
        for token in tokens.iter().filter(|t| !is_special(t)) {
            let is_word = token.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_');
            if is_word && !text.is_empty() {
                text.push(' ');
            }
            text.push_str(token);
        }
        text
    }

    pub fn token_id(&self, token: &str) -> u32 {
        match token {
            BOS_TOKEN => BOS_TOKEN_ID,
            EOS_TOKEN => EOS_TOKEN_ID,
            _ => (fnv1a(token.as_bytes()) % VOCAB_SIZE as u64) as u32,
        }
    }
}

fn is_special(token: &str) -> bool {
    token == BOS_TOKEN || token == EOS_TOKEN
}

/// 64-bit FNV-1a.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ *b as u64).wrapping_mul(PRIME))
}

/// Accepts `name` or `org/name` built from `[A-Za-z0-9._-]`.
pub fn validate_model_name(model: &str) -> Result<(), TokenizerError> {
    let invalid = || TokenizerError::InvalidModelName(model.to_string());
    if model.is_empty() || model.len() > MAX_MODEL_NAME_LEN || model.contains("..") {
        return Err(invalid());
    }
    let segments: Vec<&str> = model.split('/').collect();
    if segments.len() > 2 || segments.iter().any(|s| s.is_empty()) {
        return Err(invalid());
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if !model.chars().all(|c| c == '/' || allowed(c)) {
        return Err(invalid());
    }
    Ok(())
}

/// Loaded tokenizers keyed by model name. Safe to share across requests.
#[derive(Default)]
pub struct TokenizerCache {
    tokenizers: RwLock<HashMap<String, Arc<SimpleTokenizer>>>,
}

impl TokenizerCache {
    pub fn get_or_load(&self, model: &str) -> Result<Arc<SimpleTokenizer>, TokenizerError> {
        validate_model_name(model)?;

        if let Some(tokenizer) = self
            .tokenizers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(model)
        {
            debug!("Tokenizer cache hit: {model}");
            return Ok(Arc::clone(tokenizer));
        }

        let mut tokenizers = self
            .tokenizers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Another request may have loaded it between the locks.
        let tokenizer = tokenizers
            .entry(model.to_string())
            .or_insert_with(|| {
                info!("Loading tokenizer for model {model}");
                Arc::new(SimpleTokenizer::new(model))
            });
        Ok(Arc::clone(tokenizer))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tokenizers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TokenizeOptions {
    pub return_tokens: bool,
    pub return_token_ids: bool,
    pub add_special_tokens: bool,
    pub include_decoded: bool,
}

impl Default for TokenizeOptions {
    fn default() -> Self {
        Self {
            return_tokens: true,
            return_token_ids: true,
            add_special_tokens: false,
            include_decoded: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenizeOutput {
    pub success: bool,
    pub model: String,
    pub text: String,
    pub token_count: usize,
    pub vocab_size: u32,
    pub special_tokens: SpecialTokens,
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_ids: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded_text: Option<String>,
}

pub fn tokenize_text(
    cache: &TokenizerCache,
    text: &str,
    model: &str,
    options: TokenizeOptions,
) -> Result<TokenizeOutput, TokenizerError> {
    let tokenizer = cache.get_or_load(model)?;
    let tokens = tokenizer.encode(text, options.add_special_tokens);

    Ok(TokenizeOutput {
        success: true,
        model: tokenizer.model().to_string(),
        text: text.to_string(),
        token_count: tokens.len(),
        vocab_size: VOCAB_SIZE,
        special_tokens: tokenizer.special_tokens().clone(),
        note: "Word-level tokenizer; ids are stable hashes, not model vocabulary ids.".to_string(),
        token_ids: options
            .return_token_ids
            .then(|| tokens.iter().map(|t| tokenizer.token_id(t)).collect()),
        tokens: options
            .return_tokens
            .then(|| tokens.iter().map(|t| t.to_string()).collect()),
        decoded_text: options.include_decoded.then(|| tokenizer.decode(&tokens)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_splits_words_and_punctuation() {
        let cache = TokenizerCache::default();
        let out = tokenize_text(&cache, "Hello, world!", "simple", TokenizeOptions::default()).unwrap();
        assert_eq!(out.tokens.unwrap(), vec!["Hello", ",", "world", "!"]);
        assert_eq!(out.token_count, 4);
        assert_eq!(out.vocab_size, 50257);
    }

    #[test]
    fn test_whitespace_only_text_has_no_tokens() {
        let cache = TokenizerCache::default();
        let out = tokenize_text(&cache, " \n\t ", "simple", TokenizeOptions::default()).unwrap();
        assert_eq!(out.token_count, 0);
        assert_eq!(out.tokens.unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_token_ids_are_stable_and_in_vocab() {
        let cache = TokenizerCache::default();
        let a = tokenize_text(&cache, "grant grant", "simple", TokenizeOptions::default()).unwrap();
        let ids = a.token_ids.unwrap();
        assert_eq!(ids[0], ids[1]);
        assert!(ids.iter().all(|id| *id < VOCAB_SIZE));
        let tokenizer = cache.get_or_load("simple").unwrap();
        assert_eq!(tokenizer.token_id("grant"), ids[0]);
    }

    #[test]
    fn test_fnv1a_known_vector() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_options_omit_outputs() {
        let cache = TokenizerCache::default();
        let out = tokenize_text(
            &cache,
            "one two",
            "simple",
            TokenizeOptions {
                return_tokens: false,
                return_token_ids: false,
                ..TokenizeOptions::default()
            },
        )
        .unwrap();
        assert!(out.tokens.is_none());
        assert!(out.token_ids.is_none());
        assert_eq!(out.token_count, 2);
    }

    #[test]
    fn test_cache_reuses_instances_per_model() {
        let cache = TokenizerCache::default();
        let first = cache.get_or_load("gpt2").unwrap();
        let second = cache.get_or_load("gpt2").unwrap();
        let other = cache.get_or_load("bert-base-uncased").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_invalid_model_names_rejected() {
        for name in [
            "",
            "model with spaces",
            "model/with/too/many/slashes",
            "model@invalid",
            "model#invalid",
            "../etc/passwd",
            "/leading",
        ] {
            assert!(validate_model_name(name).is_err(), "accepted {name:?}");
        }
        for name in ["simple", "gpt2", "openai/gpt-oss-120b", "bert-base-uncased", "v1.2_x"] {
            assert!(validate_model_name(name).is_ok(), "rejected {name:?}");
        }
    }

    #[test]
    fn test_cache_is_shared_across_threads() {
        let cache = Arc::new(TokenizerCache::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get_or_load("gpt2").unwrap())
            })
            .collect();
        let loaded: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(loaded.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_special_tokens_wrap_sequence_with_reserved_ids() {
        let cache = TokenizerCache::default();
        let options = TokenizeOptions {
            add_special_tokens: true,
            ..TokenizeOptions::default()
        };
        let out = tokenize_text(&cache, "Hello world", "simple", options).unwrap();
        assert_eq!(out.tokens.unwrap(), vec!["<BOS>", "Hello", "world", "<EOS>"]);
        let ids = out.token_ids.unwrap();
        assert_eq!(ids[0], VOCAB_SIZE - 2);
        assert_eq!(ids[3], VOCAB_SIZE - 1);
        assert_eq!(out.token_count, 4);
    }

    #[test]
    fn test_decode_rejoins_words_and_punctuation() {
        let cache = TokenizerCache::default();
        let options = TokenizeOptions {
            add_special_tokens: true,
            include_decoded: true,
            ..TokenizeOptions::default()
        };
        let out = tokenize_text(&cache, "Hello,  world! How are you today?", "simple", options).unwrap();
        assert_eq!(out.decoded_text.as_deref(), Some("Hello, world! How are you today?"));

        let plain = tokenize_text(&cache, "Hello", "simple", TokenizeOptions::default()).unwrap();
        assert!(plain.decoded_text.is_none());
    }
}
