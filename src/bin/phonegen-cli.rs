use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "phonegen-cli")]
#[command(about = "Command-line client for the phone number generator API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// API key, sent when the server has authentication enabled
    #[arg(short, long)]
    key: Option<String>,

    /// Header carrying the API key
    #[arg(long, default_value = "X-API-Key")]
    key_header: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health
    Health,
    /// Generate one phone number
    Phone {
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Generate several phone numbers
    Bulk {
        #[arg(short, long)]
        count: Option<u32>,
        #[arg(short, long)]
        format: Option<String>,
    },
    /// List the supported formats with examples
    Formats,
    /// List the valid area codes
    AreaCodes,
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Health => "/health",
            Commands::Phone { .. } => "/api/phone",
            Commands::Bulk { .. } => "/api/phone/bulk",
            Commands::Formats => "/api/formats",
            Commands::AreaCodes => "/api/area-codes",
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        match self {
            Commands::Phone { format } => {
                if let Some(format) = format {
                    query.push(("format", format.clone()));
                }
            }
            Commands::Bulk { count, format } => {
                if let Some(count) = count {
                    query.push(("count", count.to_string()));
                }
                if let Some(format) = format {
                    query.push(("format", format.clone()));
                }
            }
            Commands::Health | Commands::Formats | Commands::AreaCodes => {}
        }
        query
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(
            HeaderName::from_bytes(cli.key_header.as_bytes())?,
            HeaderValue::from_str(key)?,
        );
    }

    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());
    let res = client
        .get(url)
        .headers(headers)
        .query(&cli.command.query())
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let request_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Some(id) = request_id {
            eprintln!("Request ID: {}", id);
        }
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
