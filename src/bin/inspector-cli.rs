use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "inspector-cli")]
#[command(about = "Client for the HTTP request inspector", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server status
    Status,
    /// Send a request and print how the server saw it
    Inspect {
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// Request body
        #[arg(short, long)]
        data: Option<String>,
        /// Extra header as `Name: value`, repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
    /// Echo query parameters given as KEY=VALUE
    Echo { params: Vec<String> },
    /// POST a JSON document to the data endpoint
    Send { json: String },
    /// Ask the server to persist this request
    Capture {
        #[arg(short, long)]
        data: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/api/status", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Inspect {
            method,
            data,
            headers,
        } => {
            let method = Method::from_bytes(method.to_uppercase().as_bytes())?;
            let mut req = client
                .request(method, format!("{}/api/inspect", base))
                .headers(parse_headers(&headers)?);
            if let Some(data) = data {
                req = req.body(data);
            }
            print_response(req.send().await?).await?;
        }
        Commands::Echo { params } => {
            let query: Vec<(&str, &str)> = params
                .iter()
                .map(|p| p.split_once('=').unwrap_or((p.as_str(), "")))
                .collect();
            let res = client
                .get(format!("{}/api/echo", base))
                .query(&query)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Send { json } => {
            let value: Value = serde_json::from_str(&json)?;
            let res = client
                .post(format!("{}/api/data", base))
                .json(&value)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Capture { data } => {
            let mut req = client.post(format!("{}/api/capture", base));
            if let Some(data) = data {
                req = req.header(CONTENT_TYPE, "text/plain").body(data);
            }
            print_response(req.send().await?).await?;
        }
    }

    Ok(())
}

fn parse_headers(raw: &[String]) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    for line in raw {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| format!("header '{}' is not in 'Name: value' form", line))?;
        headers.append(
            HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: inspector returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
