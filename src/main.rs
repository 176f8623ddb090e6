use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Stylize;
use std::io::{IsTerminal, Read, Write};
use std::time::Duration;
use tracing::debug;

use think::config::ConfigStore;
use think::error::ThinkError;
use think::processor::{Processor, VendorFactory};
use think::types::RequestOptions;
use think::{logging, setup};

/// Pipe text into LLM agents from different providers
#[derive(Parser, Debug)]
#[command(name = "think", version, about, long_about = None)]
struct Cli {
    /// The prompt to send to the LLM
    prompt: Option<String>,

    /// LLM provider to use (openai, anthropic); defaults to the configured provider
    #[arg(short, long)]
    provider: Option<String>,

    /// Model to use (e.g., gpt-4, claude-3-opus-20240229)
    #[arg(short, long)]
    model: Option<String>,

    /// API key for the provider (will be stored for future use)
    #[arg(short, long)]
    key: Option<String>,

    /// Configure API keys and default settings
    #[arg(short, long, default_value_t = false)]
    config: bool,

    /// Print the answer as it is generated
    #[arg(short, long, default_value_t = false)]
    stream: bool,

    /// Give up on the provider after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

/// Read piped stdin, if any. A terminal yields `None`.
fn read_piped_input() -> Result<Option<String>> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut bytes = Vec::new();
    stdin
        .lock()
        .read_to_end(&mut bytes)
        .context("Failed to read from stdin")?;
    Ok(decode_input(&bytes))
}

/// Invalid UTF-8 is replaced rather than rejected; blank input counts as absent.
fn decode_input(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Streamed output. The first write failure is kept and later chunks are dropped.
struct ChunkSink<W: Write> {
    out: W,
    error: Option<std::io::Error>,
}

impl<W: Write> ChunkSink<W> {
    fn new(out: W) -> Self {
        Self { out, error: None }
    }

    fn write_chunk(&mut self, chunk: &str) {
        if self.error.is_some() {
            return;
        }
        let result = self
            .out
            .write_all(chunk.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(err) = result {
            self.error = Some(err);
        }
    }

    fn finish(mut self) -> std::io::Result<()> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut store = ConfigStore::open_default()?;
    debug!(path = %store.path().display(), "using config file");

    if cli.config {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        return setup::run_setup(&mut store, &mut stdin.lock(), &mut stdout);
    }

    let input = read_piped_input()?;
    if cli.prompt.as_deref().map_or(true, str::is_empty) && input.is_none() {
        return Err(ThinkError::MissingInput.into());
    }

    let options = RequestOptions {
        prompt: cli.prompt,
        input,
        provider: cli.provider,
        model: cli.model,
        api_key: cli.key,
    };
    let factory = VendorFactory {
        timeout: cli.timeout.map(Duration::from_secs),
    };
    let mut processor = Processor::with_factory(&mut store, factory);

    if cli.stream {
        let mut sink = ChunkSink::new(std::io::stdout());
        processor
            .stream_input(&options, &mut |chunk: &str| sink.write_chunk(chunk))
            .await?;
        sink.finish().context("Failed to write to stdout")?;
    } else {
        let answer = processor.process_input(&options).await?;
        writeln!(std::io::stdout(), "{}", answer).context("Failed to write to stdout")?;
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{}", format!("Error: {}", err).red());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_all_flags() {
        let cli = Cli::try_parse_from([
            "think", "summarize", "-p", "anthropic", "-m", "claude-3-haiku-20240307", "-k",
            "sk-ant", "--stream", "--timeout", "30",
        ])
        .unwrap();
        assert_eq!(cli.prompt.as_deref(), Some("summarize"));
        assert_eq!(cli.provider.as_deref(), Some("anthropic"));
        assert_eq!(cli.model.as_deref(), Some("claude-3-haiku-20240307"));
        assert_eq!(cli.key.as_deref(), Some("sk-ant"));
        assert!(cli.stream);
        assert!(!cli.config);
        assert_eq!(cli.timeout, Some(30));
    }

    #[test]
    fn test_provider_has_no_builtin_default() {
        let cli = Cli::try_parse_from(["think", "hello"]).unwrap();
        assert!(cli.provider.is_none());
        assert!(cli.model.is_none());
        assert!(cli.key.is_none());
    }

    /// Accepts `limit` bytes, then fails every write like a closed pipe.
    struct ClosingWriter {
        written: Vec<u8>,
        limit: usize,
        attempts: usize,
    }

    impl Write for ClosingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.attempts += 1;
            if self.written.len() + buf.len() > self.limit {
                return Err(std::io::ErrorKind::BrokenPipe.into());
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_chunk_sink_writes_chunks_then_newline() {
        let mut out = Vec::new();
        let mut sink = ChunkSink::new(&mut out);
        sink.write_chunk("Hello");
        sink.write_chunk(", world");
        sink.finish().unwrap();
        assert_eq!(out, b"Hello, world\n");
    }

    #[test]
    fn test_chunk_sink_stops_after_write_failure() {
        let mut writer = ClosingWriter {
            written: Vec::new(),
            limit: 3,
            attempts: 0,
        };
        let mut sink = ChunkSink::new(&mut writer);
        sink.write_chunk("par");
        sink.write_chunk("tial");
        sink.write_chunk("more");
        let err = sink.finish().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
        assert_eq!(writer.written, b"par");
        assert_eq!(writer.attempts, 2);
    }

    #[test]
    fn test_decode_input_replaces_invalid_utf8() {
        assert_eq!(decode_input(b"\xE9").as_deref(), Some("\u{FFFD}"));
        assert_eq!(decode_input(b"  caf\xC3\xA9\n").as_deref(), Some("caf\u{e9}"));
        assert_eq!(decode_input(b" \n\t"), None);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
