use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use streamxml::{AttributePolicy, Config, Document, Element};

/// Deepest tree `--format json` will serialize
const JSON_MAX_DEPTH: usize = 1024;

#[derive(Debug, Parser)]
#[command(name = "streamxml", version, about = "Parse XML and print its element tree")]
struct Args {
    /// Input file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Outline)]
    format: FormatArg,
    /// Keep duplicate attributes in document order
    #[arg(long)]
    unsorted: bool,
    /// Maximum element nesting, 0 for unlimited
    #[arg(long, value_name = "N")]
    max_depth: Option<u16>,
    /// Log parser activity to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Outline,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = build_config(&args);
    let doc = match &args.input {
        Some(path) => streamxml::parse_file(path, config)?,
        None => streamxml::parse_reader_with_config(io::stdin().lock(), config)?,
    };

    let output = match args.format {
        FormatArg::Outline => outline(&doc),
        FormatArg::Json => {
            let depth = doc.root().depth();
            if depth > JSON_MAX_DEPTH {
                bail!(
                    "document nests {depth} levels; JSON output supports at most {JSON_MAX_DEPTH}, use --format outline"
                );
            }
            let mut json =
                serde_json::to_string_pretty(&doc).context("failed to serialize document")?;
            json.push('\n');
            json
        }
    };

    io::stdout()
        .lock()
        .write_all(output.as_bytes())
        .context("failed to write stdout")?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = if verbose {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn build_config(args: &Args) -> Config {
    let mut config = Config::default();
    if args.unsorted {
        config = config.with_attribute_policy(AttributePolicy::Unsorted);
    }
    if let Some(depth) = args.max_depth {
        config = config.with_max_depth(depth);
    }
    config
}

fn outline(doc: &Document) -> String {
    let mut out = String::new();
    if let Some(version) = doc.version() {
        out.push_str(&format!("<?xml version={version}?>\n"));
    }
    if !doc.doctype().is_empty() {
        out.push_str(&format!("<!DOCTYPE {}>\n", doc.doctype().join(" ")));
    }

    // Explicit stack keeps deep documents off the call stack
    let mut stack: Vec<(&Element, usize)> = vec![(doc.root(), 0)];
    while let Some((element, depth)) = stack.pop() {
        out.push_str(&outline_line(element, depth));
        stack.extend(element.children().iter().rev().map(|c| (c, depth + 1)));
    }
    out
}

fn outline_line(element: &Element, depth: usize) -> String {
    let mut line = format!("{:indent$}{}", "", element.name(), indent = depth * 2);
    for (key, value) in element.attributes().iter() {
        line.push_str(&format!(" {key}={value:?}"));
    }
    let text = element.text().trim();
    if !text.is_empty() {
        line.push_str(&format!(": {text:?}"));
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline() -> streamxml::Result<()> {
        let doc = streamxml::parse_str(
            "<?xml version=\"1.0\"?><a x=\"1\">  hi <b/><c>t</c></a>",
        )?;
        assert_eq!(
            outline(&doc),
            "<?xml version=1.0?>\na x=\"1\": \"hi\"\n  b\n  c: \"t\"\n"
        );
        Ok(())
    }

    #[test]
    fn test_outline_deep_document() -> streamxml::Result<()> {
        let depth = 2_000;
        let input = format!("{}{}", "<n>".repeat(depth), "</n>".repeat(depth));
        let doc = streamxml::parse_bytes_with_config(input.as_bytes(), Config::unlimited_depth())?;
        let out = outline(&doc);
        assert_eq!(out.lines().count(), depth);
        assert_eq!(out.lines().last().map(str::len), Some((depth - 1) * 2 + 1));
        Ok(())
    }

    #[test]
    fn test_build_config() {
        let args = Args::parse_from(["streamxml", "--unsorted", "--max-depth", "0"]);
        let config = build_config(&args);
        assert_eq!(config.attribute_policy, AttributePolicy::Unsorted);
        assert_eq!(config.max_depth, 0);
        assert_eq!(args.format, FormatArg::Outline);
    }
}
