use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Smoke-test CLI for the chat completion gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8787")]
    url: String,

    /// Proxy token presented as a bearer token.
    #[arg(short, long, env = "METLY_PROXY_TOKEN", default_value = "")]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single user message through the gateway
    Chat {
        /// Model identifier understood by the upstream
        #[arg(short, long, default_value = "openai/gpt-4o-mini")]
        model: String,
        /// Message content
        message: String,
    },
    /// Issue a CORS preflight and print the returned headers
    Preflight,
}

const CHAT_PATH: &str = "/v1/chat/completions";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let endpoint = format!("{}{}", cli.url.trim_end_matches('/'), CHAT_PATH);

    match cli.command {
        Commands::Chat { model, message } => {
            let mut headers = HeaderMap::new();
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", cli.token))?,
            );
            let res = client
                .post(&endpoint)
                .headers(headers)
                .json(&json!({
                    "model": model,
                    "messages": [{ "role": "user", "content": message }],
                }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Preflight => {
            let res = client
                .request(reqwest::Method::OPTIONS, &endpoint)
                .send()
                .await?;
            println!("Status: {}", res.status());
            for (name, value) in res.headers() {
                if name.as_str().starts_with("access-control-") {
                    println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
                }
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("Response: {}", text);
        return Ok(());
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
