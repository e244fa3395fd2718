use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use tracing::{debug, info};

use cortex_forms::{serialize, Document};

#[derive(Parser)]
#[command(name = "cortex-forms")]
#[command(about = "Resolve links and compute form submissions the way a browser would")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the fields of a form and the request submitting it would send
    Form {
        /// HTML file path, or '-' for stdin
        input: String,

        /// URI the page was loaded from
        #[arg(short, long)]
        uri: Option<String>,

        /// CSS selector of the form (first form when omitted)
        #[arg(short, long)]
        selector: Option<String>,

        /// Override the form's method
        #[arg(short, long)]
        method: Option<String>,

        /// Assign a field before submitting, as name=value (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        assignments: Vec<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List every link of a page with its resolved URI
    Links {
        /// HTML file path, or '-' for stdin
        input: String,

        /// URI the page was loaded from
        #[arg(short, long)]
        uri: Option<String>,

        /// CSS selector narrowing the links (all anchors when omitted)
        #[arg(short, long)]
        selector: Option<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Form {
            input,
            uri,
            selector,
            method,
            assignments,
            format,
        } => {
            info!(input = %input, format = %format, "form command");
            run_form(
                &input,
                uri.as_deref(),
                selector.as_deref(),
                method.as_deref(),
                &assignments,
                &format,
            )
        }
        Commands::Links {
            input,
            uri,
            selector,
            format,
        } => {
            info!(input = %input, format = %format, "links command");
            run_links(&input, uri.as_deref(), selector.as_deref(), &format)
        }
    }
}

fn run_form(
    input: &str,
    uri: Option<&str>,
    selector: Option<&str>,
    method: Option<&str>,
    assignments: &[String],
    format: &str,
) -> Result<()> {
    let doc = load(input, uri)?;
    let mut form = doc.form(selector, method)?;

    for assignment in assignments {
        let Some((name, value)) = assignment.split_once('=') else {
            bail!("invalid assignment \"{assignment}\", expected name=value");
        };
        form.set(name, value)
            .with_context(|| format!("failed to set field \"{name}\""))?;
        debug!(name = %name, "assigned field");
    }

    let output = match format {
        "json" => serde_json::to_string_pretty(&form.submission())?,
        _ => serialize::to_compact_text(&form),
    };
    print!("{output}");
    Ok(())
}

fn run_links(input: &str, uri: Option<&str>, selector: Option<&str>, format: &str) -> Result<()> {
    let doc = load(input, uri)?;
    let links = doc.links(selector)?;
    info!(links = links.len(), "resolved links");

    let output = match format {
        "json" => {
            let resolved: Vec<serde_json::Value> = links
                .iter()
                .map(|link| {
                    serde_json::json!({
                        "tag": link.tag(),
                        "text": link.text(),
                        "href": link.raw_uri(),
                        "uri": link.uri(),
                    })
                })
                .collect();
            serde_json::to_string_pretty(&resolved)?
        }
        _ => serialize::links_to_compact_text(&links),
    };
    print!("{output}");
    Ok(())
}

fn load(input: &str, uri: Option<&str>) -> Result<Document> {
    let html = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {input}"))?
    };

    debug!(html_len = html.len(), "loaded page");
    Ok(Document::parse(&html, uri)?)
}
