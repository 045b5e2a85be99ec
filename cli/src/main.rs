use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use reqwest::StatusCode;
use shared::{ImportThreatsRequest, ImportThreatsResponse, NewThreat, SignInResponse};

/// Bulk-import indicators of compromise from a JSON file.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Account used to authenticate against the API.
    username: String,
    password: String,

    /// JSON file holding an array of indicators.
    file: PathBuf,

    #[arg(long, env = "THREAT_HUB_ENDPOINT", default_value = "http://localhost:3000")]
    endpoint: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    println!("Using endpoint: {endpoint}", endpoint = args.endpoint);
    let file = File::open(&args.file)?;
    let threats: Vec<NewThreat> = serde_json::from_reader(BufReader::new(file))?;
    if threats.is_empty() {
        return Err(anyhow::anyhow!("No indicators found in {:?}", args.file));
    }
    println!(
        "Loaded {count} indicators from {file:?}",
        count = threats.len(),
        file = args.file
    );

    let http = reqwest::Client::new();

    println!("Doing sign-in to get new token...");
    let credentials = serde_json::json!({
        "username": args.username,
        "password": args.password,
    });
    let response = http
        .post(format!("{endpoint}/api/auth/sign-in", endpoint = args.endpoint))
        .json(&credentials)
        .send()
        .await?;
    if response.status() != StatusCode::OK {
        let message = response.text().await?;
        return Err(anyhow::anyhow!(
            "Sign-in attempt fail, wrong credentials, message={message}"
        ));
    }
    let sign_in = response.json::<SignInResponse>().await?;
    println!(
        "Sign-in succeeded, user_id: {user_id}, username: {username}, token_type: {token_type}",
        user_id = sign_in.user_id,
        username = sign_in.username,
        token_type = sign_in.token_type
    );

    println!("Importing indicators...");
    let request = ImportThreatsRequest { threats };
    let response = http
        .post(format!("{endpoint}/api/threats", endpoint = args.endpoint))
        .bearer_auth(&sign_in.access_token)
        .json(&request)
        .send()
        .await?;
    if response.status() != StatusCode::OK {
        let message = response.text().await?;
        return Err(anyhow::anyhow!(
            "Import failed, status was not OK, message={message}"
        ));
    }
    let imported = response.json::<ImportThreatsResponse>().await?;
    println!("Done, imported {count} indicators", count = imported.imported);

    Ok(())
}
