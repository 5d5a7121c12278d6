//! Free-form NGO profile and grant context supplied by the client.
//!
//! Both are open JSON objects: known keys have typed accessors with the
//! defaults used in prompts, unknown keys pass through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NgoProfile(pub Map<String, Value>);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantContext(pub Map<String, Value>);

impl NgoProfile {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !is_blank(v))
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.get(key).map(display).unwrap_or_else(|| default.to_string())
    }

    pub fn organization_name(&self) -> Option<String> {
        self.get("organization_name").map(display)
    }

    /// Focus areas joined with ", "; accepts a list or a single string.
    pub fn focus_areas_or(&self, default: &str) -> String {
        match self.get("focus_areas") {
            Some(Value::Array(items)) => items.iter().map(display).collect::<Vec<_>>().join(", "),
            Some(other) => display(other),
            None => default.to_string(),
        }
    }

    pub fn annual_budget_display(&self) -> String {
        dollars_or(self.get("annual_budget"), "$500,000")
    }
}

impl GrantContext {
    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.0
            .get(key)
            .filter(|v| !is_blank(v))
            .map(display)
            .unwrap_or_else(|| default.to_string())
    }

    /// Maximum award formatted as dollars with thousands separators.
    pub fn max_amount_display(&self) -> String {
        dollars_or(self.0.get("max_amount"), "$50,000")
    }
}

/// Formats a numeric or numeric-string amount as `$12,345`; other non-blank
/// values are prefixed with `$` verbatim.
fn dollars_or(value: Option<&Value>, default: &str) -> String {
    let amount = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.replace(|c: char| c == ',' || c == '$', "").trim().parse::<f64>().ok(),
        _ => None,
    };
    match amount {
        Some(a) => format!("${}", group_thousands(a.round() as i64)),
        None => match value.filter(|v| !is_blank(v)) {
            Some(raw) => format!("${}", display(raw)),
            None => default.to_string(),
        },
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

fn display(value: &Value) -> String {
    crate::llm_client::prompts::value_text(value)
}

pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        format!("-{out}")
    } else {
        out
    }
}
