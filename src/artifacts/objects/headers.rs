//! Header fields with a trailing message
//!
//! Commit and tag objects share one text layout:
//!
//! ```text
//! key value
//! key value
//!  continuation of the previous value
//!
//! free-form message
//! ```
//!
//! A value spanning several lines is written with every embedded newline
//! followed by a single space; parsing folds those lines back. Field order
//! is preserved and repeated keys (e.g. `parent`) are kept as separate fields.

use anyhow::Context;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
    message: String,
}

impl Headers {
    pub fn push(&mut self, key: &str, value: impl Into<String>) {
        self.fields.push((key.to_string(), value.into()));
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let mut headers = Headers::default();
        let mut rest = content;

        loop {
            if let Some(message) = rest.strip_prefix('\n') {
                headers.message = message.to_string();
                break;
            }

            let line_end = rest
                .find('\n')
                .context("header block is not terminated by a blank line")?;
            let line = &rest[..line_end];
            rest = &rest[line_end + 1..];

            match line.strip_prefix(' ') {
                Some(continuation) => {
                    let (_, value) = headers
                        .fields
                        .last_mut()
                        .context("continuation line without a header")?;
                    value.push('\n');
                    value.push_str(continuation);
                }
                None => {
                    let (key, value) = line
                        .split_once(' ')
                        .with_context(|| format!("malformed header line: {line:?}"))?;
                    if key.is_empty() {
                        anyhow::bail!("empty header key");
                    }
                    headers.push(key, value);
                }
            }
        }

        Ok(headers)
    }

    pub fn serialize(&self) -> String {
        let mut content = String::new();

        for (key, value) in &self.fields {
            content.push_str(key);
            content.push(' ');
            content.push_str(&value.replace('\n', "\n "));
            content.push('\n');
        }
        content.push('\n');
        content.push_str(&self.message);

        content
    }
}
