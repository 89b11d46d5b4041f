use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "deposit-cli")]
#[command(about = "Client for a running deposit-gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8350")]
    url: String,

    /// Bearer key, when the gateway has `[auth] api_key` set.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// List depositions, or fetch one by id
    List {
        #[arg(long)]
        id: Option<u64>,
    },
    /// Create a deposition, optionally with a JSON metadata file
    Create {
        #[arg(long)]
        metadata: Option<PathBuf>,
    },
    /// Replace a deposition's metadata with the contents of FILE
    Update { id: u64, file: PathBuf },
    /// Upload FILE into BUCKET
    Upload {
        bucket: String,
        file: PathBuf,
        /// Name in the bucket (defaults to the local file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Publish a deposition
    Publish { id: u64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/status", cli.url)),
        Commands::List { id: None } => client.get(format!("{}/docs", cli.url)),
        Commands::List { id: Some(id) } => client.get(format!("{}/docs/{}", cli.url, id)),
        Commands::Create { metadata } => {
            let body = match metadata {
                Some(path) => tokio::fs::read(path).await?,
                None => b"{}".to_vec(),
            };
            client
                .post(format!("{}/create", cli.url))
                .header(CONTENT_TYPE, "application/json")
                .body(body)
        }
        Commands::Update { id, file } => client
            .put(format!("{}/update/{}", cli.url, id))
            .header(CONTENT_TYPE, "application/json")
            .body(tokio::fs::read(file).await?),
        Commands::Upload { bucket, file, name } => {
            let name = match name {
                Some(name) => name,
                None => file
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or("cannot derive a file name, pass --name")?
                    .to_string(),
            };
            client
                .put(format!("{}/add/{}/{}", cli.url, bucket, name))
                .body(tokio::fs::read(&file).await?)
        }
        Commands::Publish { id } => client.post(format!("{}/publish/{}", cli.url, id)),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
