use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Source of a generation task's text. Precedence on submission is
/// file > url > text; only the highest-priority non-empty source is used.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    File,
    Url,
}

impl Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            InputKind::Text => "text",
            InputKind::File => "file",
            InputKind::Url => "url",
        };
        write!(f, "{}", kind)
    }
}

impl FromStr for InputKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(InputKind::Text),
            "file" => Ok(InputKind::File),
            "url" => Ok(InputKind::Url),
            other => Err(anyhow::anyhow!("unknown input kind: {}", other)),
        }
    }
}
