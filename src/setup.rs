//! Interactive first-time setup (`think --config`).

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use std::io::{BufRead, Write};

use crate::config::{ConfigStore, DEFAULT_PROVIDER};
use crate::llm::ProviderKind;

/// Ask for a key and default model per provider, then the default provider.
///
/// Skipped providers (empty key) keep whatever is already stored. End of
/// input counts as an empty answer.
pub fn run_setup<R: BufRead, W: Write>(
    store: &mut ConfigStore,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    writeln!(output, "{}", "=== Think CLI Configuration ===".blue())?;

    for kind in ProviderKind::ALL {
        let name = kind.display_name();
        writeln!(output, "{}", format!("\n{} Configuration:", name).yellow())?;

        let key = ask(input, output, &format!("{} API Key (leave empty to skip): ", name))?;
        if key.is_empty() {
            continue;
        }
        store.set_api_key(kind.as_str(), &key)?;

        let model = ask(
            input,
            output,
            &format!("Default {} model [{}]: ", name, kind.default_model()),
        )?;
        let model = if model.is_empty() {
            kind.default_model().to_string()
        } else {
            model
        };
        store.set_default_model(kind.as_str(), &model)?;
    }

    writeln!(output, "{}", "\nDefault Provider:".yellow())?;
    let choices: Vec<&str> = ProviderKind::ALL.iter().map(|k| k.as_str()).collect();
    let provider = ask(
        input,
        output,
        &format!(
            "Default provider ({}) [{}]: ",
            choices.join(", "),
            DEFAULT_PROVIDER
        ),
    )?;
    let provider = if provider.is_empty() {
        DEFAULT_PROVIDER.to_string()
    } else {
        provider
    };
    store.set_default_provider(&provider)?;

    writeln!(output, "{}", "\nConfiguration saved successfully!".green())?;
    writeln!(output, "Saved to {}", store.path().display())?;
    Ok(())
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read answer")?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn temp_store() -> (tempfile::TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("config.toml")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_full_setup() {
        let (_dir, mut store) = temp_store();
        let mut input = Cursor::new("sk-openai\ngpt-4o\nsk-ant\n\nanthropic\n");
        let mut output = Vec::new();

        run_setup(&mut store, &mut input, &mut output).unwrap();

        assert_eq!(store.api_key("openai"), Some("sk-openai"));
        assert_eq!(store.default_model("openai"), Some("gpt-4o"));
        assert_eq!(store.api_key("anthropic"), Some("sk-ant"));
        assert_eq!(store.default_model("anthropic"), Some("claude-3-opus-20240229"));
        assert_eq!(store.default_provider(), "anthropic");

        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("OpenAI API Key (leave empty to skip): "));
        assert!(transcript.contains("Default Anthropic model [claude-3-opus-20240229]: "));
        assert!(transcript.contains("Configuration saved successfully!"));
    }

    #[test]
    fn test_skipped_provider_asks_no_model() {
        let (_dir, mut store) = temp_store();
        let mut input = Cursor::new("\nsk-ant\nclaude-3-haiku-20240307\n\n");
        let mut output = Vec::new();

        run_setup(&mut store, &mut input, &mut output).unwrap();

        assert!(store.provider_config("openai").is_none());
        assert_eq!(store.default_model("anthropic"), Some("claude-3-haiku-20240307"));
        assert_eq!(store.default_provider(), "openai");
        let transcript = String::from_utf8(output).unwrap();
        assert!(!transcript.contains("Default OpenAI model"));
    }

    #[test]
    fn test_end_of_input_uses_defaults() {
        let (_dir, mut store) = temp_store();
        let mut input = Cursor::new("");
        let mut output = Vec::new();

        run_setup(&mut store, &mut input, &mut output).unwrap();

        assert!(store.api_key("openai").is_none());
        assert!(store.api_key("anthropic").is_none());
        assert_eq!(store.default_provider(), "openai");
        assert!(store.path().exists());
    }
}
