//! Prompt template rendering and the streaming entry point

use crate::client::ChatMessage;
use crate::client::CompletionClient;
use crate::errors::AssistantError;
use crate::errors::Result;
use crate::stream::CompletionStream;

/// Fill `{name}` placeholders in a template from `vars`.
///
/// Every placeholder must have a value; unused vars are fine. Values are
/// substituted verbatim in a single pass, so braces inside a value are
/// never re-expanded.
pub fn render(template: &str, vars: &[(&str, &str)]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            return Err(AssistantError::Template(
                "unclosed '{' in prompt template".to_string(),
            ));
        };
        let name = &after[..end];
        match vars.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => {
                return Err(AssistantError::Template(format!(
                    "no value for placeholder '{{{name}}}'"
                )));
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Render a prompt pair and start a streaming completion.
///
/// This is the one entry point the application features go through. A
/// missing or blank API key fails with [`AssistantError::Unavailable`]
/// before any network traffic, so features degrade cleanly when no key
/// was provided at login.
pub async fn stream_prompt(
    client: &dyn CompletionClient,
    api_key: Option<&str>,
    system_prompt: &str,
    human_template: &str,
    vars: &[(&str, &str)],
) -> Result<CompletionStream> {
    let key = match api_key.map(str::trim) {
        Some(key) if !key.is_empty() => key,
        _ => {
            return Err(AssistantError::Unavailable(
                "no API key for this session".to_string(),
            ));
        }
    };

    let human = render(human_template, vars)?;
    let messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(human)];
    client.complete(key, messages).await
}
