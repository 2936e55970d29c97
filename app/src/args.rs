//! CLI argument parsing with clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Answer questions about web pages, getting past CAPTCHA gates on the way.
///
/// Pages are rendered in headless Chromium. When a page is gated by an image
/// CAPTCHA, a vision model reads the challenge and the page is fetched again
/// before the question is answered.
#[derive(Debug, Parser)]
#[command(name = "pagesight", version)]
pub struct Cli {
    /// Configuration file [default: platform config dir]/pagesight/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    #[command(after_help = "\
Endpoints:
  POST /ask      {\"url\": \"...\", \"query\": \"...\"}
  GET  /health")]
    Serve(ServeArgs),

    /// Answer one question about one page and exit
    #[command(after_help = "\
Examples:
  pagesight ask https://example.com/product 'What is the price?'
  pagesight ask --json https://example.com 'Who wrote this?'
  pagesight ask --max-captcha-attempts 1 https://example.com 'What is shown?'")]
    Ask(AskArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Bind host [default: from config]
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port [default: from config]
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Args)]
pub struct AskArgs {
    /// Page to fetch (http or https)
    pub url: String,

    /// Question about the page
    pub query: String,

    /// CAPTCHA solve cycles before giving up [default: from config]
    #[arg(long, value_name = "N")]
    pub max_captcha_attempts: Option<u32>,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}
