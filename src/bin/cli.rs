//! Salon CLI
//!
//! Command-line interface for salon administrators:
//! - Sign in and out of the console
//! - Review and update the appointment board
//! - Manage the service catalog and the published salon info
//! - Read the monthly revenue summary
//! - Generate a config file and create administrators locally

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder, Response};
use salon::auth::{AuthManager, AuthPolicy};
use salon::config::Config;
use salon::storage::SalonStore;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "salon-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Administration client for the salon console")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8082", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in as an administrator and remember the session
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// End the remembered session
    Logout,

    /// Show server health
    Status,

    /// List appointments on the board
    Appointments {
        /// all, pending, today, confirmed, finished
        #[arg(long, default_value = "all")]
        filter: String,
        /// Match on client or service name
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Change an appointment's status
    SetStatus {
        id: String,
        /// pending, confirmed, finished
        status: String,
    },

    /// Service catalog
    Services {
        #[command(subcommand)]
        action: Option<ServiceAction>,
    },

    /// Published salon info
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Monthly revenue summary
    Finance {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create an administrator directly in the local store
    CreateAdmin {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long, default_value = "Administrator")]
        name: String,
        /// Server config file locating the data directory
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ServiceAction {
    /// List services
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add a service
    Add {
        name: String,
        price: f64,
        /// Minutes
        duration: u32,
    },
    /// Remove a service
    Remove { id: String },
    /// Insert the default catalog if it is empty
    Seed,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show the published info
    Show,
    /// Publish changes (only the given fields are updated)
    Publish {
        #[arg(long)]
        whatsapp: Option<String>,
        #[arg(long)]
        street: Option<String>,
        #[arg(long)]
        number: Option<String>,
        #[arg(long)]
        neighborhood: Option<String>,
        #[arg(long)]
        city: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.api_url);

    match cli.command {
        Commands::Login { email, password } => {
            let body = json!({ "email": email, "password": password, "audience": "console" });
            let data = api.send(api.client.post(api.url("/auth/login")).json(&body)).await?;

            let token = data["token"].as_str().context("login response without token")?;
            save_token(token)?;
            println!(
                "Signed in as {} (session expires {})",
                data["user"]["name"].as_str().unwrap_or("-"),
                data["expires_at"].as_str().unwrap_or("-")
            );
        }

        Commands::Logout => {
            let token = load_token()?;
            api.send(api.client.post(api.url("/auth/logout")).bearer_auth(&token))
                .await?;
            if let Some(path) = token_path() {
                let _ = std::fs::remove_file(path);
            }
            println!("Signed out");
        }

        Commands::Status => {
            let response = api.client.get(format!("{}/health", api.base)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: Value = resp.json().await?;
                    if cli.format == "json" {
                        println!("{}", serde_json::to_string_pretty(&health)?);
                    } else {
                        println!("Salon console v{}", env!("CARGO_PKG_VERSION"));
                        println!();
                        println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
                        println!("Storage: {}", health["storage"].as_str().unwrap_or("-"));
                        println!("Push: {}", health["push"].as_str().unwrap_or("-"));
                        println!("Live connections: {}", health["ws_connections"]);
                        println!("Pending reminders: {}", health["pending_reminders"]);
                        if let Some(uptime) = health["uptime_seconds"].as_u64() {
                            println!("Uptime: {}", format_duration(uptime));
                        }
                    }
                }
                Ok(resp) => bail!("API returned error: {}", resp.status()),
                Err(e) => {
                    eprintln!("Cannot connect to the salon API at {}", api.base);
                    eprintln!();
                    eprintln!("Make sure the server is running:");
                    eprintln!("  cargo run --bin salon");
                    return Err(e.into());
                }
            }
        }

        Commands::Appointments { filter, search } => {
            let token = load_token()?;
            let mut query = vec![("filter", filter)];
            if let Some(search) = search {
                query.push(("search", search));
            }
            let data = api
                .send(
                    api.client
                        .get(api.url("/appointments"))
                        .bearer_auth(&token)
                        .query(&query),
                )
                .await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_appointments(&data);
            }
        }

        Commands::SetStatus { id, status } => {
            let token = load_token()?;
            let data = api
                .send(
                    api.client
                        .put(api.url(&format!("/appointments/{}/status", id)))
                        .bearer_auth(&token)
                        .json(&json!({ "status": status })),
                )
                .await?;
            println!(
                "{} is now {}",
                data["service_name"].as_str().unwrap_or(&id),
                data["status"].as_str().unwrap_or(&status)
            );
        }

        Commands::Services { action } => {
            match action.unwrap_or(ServiceAction::List { search: None }) {
                ServiceAction::List { search } => {
                    let mut request = api.client.get(api.url("/services"));
                    if let Some(search) = search {
                        request = request.query(&[("search", search)]);
                    }
                    let data = api.send(request).await?;

                    if cli.format == "json" {
                        println!("{}", serde_json::to_string_pretty(&data)?);
                    } else {
                        print_services(&data);
                    }
                }
                ServiceAction::Add {
                    name,
                    price,
                    duration,
                } => {
                    let token = load_token()?;
                    let data = api
                        .send(
                            api.client
                                .post(api.url("/services"))
                                .bearer_auth(&token)
                                .json(&json!({ "name": name, "price": price, "duration": duration })),
                        )
                        .await?;
                    println!("Created service {}", data["id"].as_str().unwrap_or("-"));
                }
                ServiceAction::Remove { id } => {
                    let token = load_token()?;
                    api.send(
                        api.client
                            .delete(api.url(&format!("/services/{}", id)))
                            .bearer_auth(&token),
                    )
                    .await?;
                    println!("Removed service {}", id);
                }
                ServiceAction::Seed => {
                    let token = load_token()?;
                    let data = api
                        .send(api.client.post(api.url("/services/seed")).bearer_auth(&token))
                        .await?;
                    if data["seeded"].as_bool().unwrap_or(false) {
                        println!("Inserted {} default services", data["inserted"]);
                    } else {
                        println!("Catalog already has services, nothing inserted");
                    }
                }
            }
        }

        Commands::Settings { action } => match action.unwrap_or(SettingsAction::Show) {
            SettingsAction::Show => {
                let data = api.send(api.client.get(api.url("/settings"))).await?;
                print_settings(&data, &cli.format)?;
            }
            SettingsAction::Publish {
                whatsapp,
                street,
                number,
                neighborhood,
                city,
            } => {
                let token = load_token()?;
                let mut body = serde_json::Map::new();
                for (key, value) in [
                    ("whatsapp", whatsapp),
                    ("street", street),
                    ("number", number),
                    ("neighborhood", neighborhood),
                    ("city", city),
                ] {
                    if let Some(value) = value {
                        body.insert(key.to_string(), Value::String(value));
                    }
                }

                let data = api
                    .send(
                        api.client
                            .put(api.url("/settings"))
                            .bearer_auth(&token)
                            .json(&Value::Object(body)),
                    )
                    .await?;
                println!("Published");
                print_settings(&data, &cli.format)?;
            }
        },

        Commands::Finance { year, month } => {
            let token = load_token()?;
            let mut query = Vec::new();
            if let Some(year) = year {
                query.push(("year", year.to_string()));
            }
            if let Some(month) = month {
                query.push(("month", month.to_string()));
            }
            let data = api
                .send(
                    api.client
                        .get(api.url("/finance/summary"))
                        .bearer_auth(&token)
                        .query(&query),
                )
                .await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{}-{:0>2}", data["year"], data["month"]);
                println!("  Revenue:       {:>10.2}", data["real"].as_f64().unwrap_or(0.0));
                println!("  Confirmed:     {:>10.2}", data["projection"].as_f64().unwrap_or(0.0));
                println!("  Appointments:  {:>10}", data["count"]);
                println!("  Avg. ticket:   {:>10.2}", data["average_ticket"].as_f64().unwrap_or(0.0));
                println!(
                    "  Goal:          {:>10.2} ({:.0}%)",
                    data["goal"].as_f64().unwrap_or(0.0),
                    data["progress"].as_f64().unwrap_or(0.0)
                );
                println!("  Year to date:  {:>10.2}", data["total_year"].as_f64().unwrap_or(0.0));
            }
        }

        Commands::Config { output } => {
            let config = salon::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }

        Commands::CreateAdmin {
            email,
            password,
            name,
            config,
        } => {
            let config = match config {
                Some(path) => Config::load_with_env(&path)?,
                None => Config::load_default(),
            };
            let store_config = config.store_config();
            let store = Arc::new(SalonStore::open(&store_config)?);
            let auth = AuthManager::new(store, AuthPolicy::default());

            match auth.ensure_admin(&email, &password, &name).await? {
                Some(profile) => println!("Created administrator {} ({})", profile.email, profile.id),
                None => println!("An account for {} already exists", email),
            }
        }
    }

    Ok(())
}

struct ApiClient {
    client: Client,
    base: String,
}

impl ApiClient {
    fn new(base: &str) -> Self {
        Self {
            client: Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base, path)
    }

    /// Send a request, turning API error bodies into errors
    async fn send(&self, request: RequestBuilder) -> anyhow::Result<Value> {
        let response: Response = request.send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| {
                    let code = v["error"]["code"].as_str()?.to_string();
                    let message = v["error"]["message"].as_str().unwrap_or_default().to_string();
                    Some(format!("{}: {}", code, message))
                })
                .unwrap_or(text);
            bail!("Request failed ({}): {}", status, detail);
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

fn token_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("salon").join("session"))
}

fn save_token(token: &str) -> anyhow::Result<()> {
    let path = token_path().context("no config directory for this user")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, token)?;
    Ok(())
}

fn load_token() -> anyhow::Result<String> {
    if let Ok(token) = std::env::var("SALON_TOKEN") {
        return Ok(token);
    }
    let path = token_path().context("no config directory for this user")?;
    let token = std::fs::read_to_string(&path)
        .with_context(|| "not signed in; run `salon-cli login` first".to_string())?;
    Ok(token.trim().to_string())
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn print_appointments(data: &Value) {
    let rows = match data["appointments"].as_array() {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            println!("No appointments");
            return;
        }
    };

    println!(
        "{:<17} {:<20} {:<22} {:>8} {:<10} {}",
        "Date", "Client", "Service", "Price", "Status", "ID"
    );
    println!("{}", "-".repeat(110));

    for row in rows {
        let date = row["date"]
            .as_str()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<17} {:<20} {:<22} {:>8.2} {:<10} {}",
            date,
            row["user_name"].as_str().unwrap_or("-"),
            row["service_name"].as_str().unwrap_or("-"),
            row["price"].as_f64().unwrap_or(0.0),
            row["status"].as_str().unwrap_or("-"),
            row["id"].as_str().unwrap_or("-")
        );
    }
    println!();
    println!("{} appointment(s)", data["total"]);
}

fn print_services(data: &Value) {
    let rows = match data["services"].as_array() {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            println!("No services yet.");
            println!();
            println!("Seed the default catalog with:");
            println!("  salon-cli services seed");
            return;
        }
    };

    println!("{:<28} {:>8} {:>6} {}", "Name", "Price", "Min", "ID");
    println!("{}", "-".repeat(80));
    for row in rows {
        println!(
            "{:<28} {:>8.2} {:>6} {}",
            row["name"].as_str().unwrap_or("-"),
            row["price"].as_f64().unwrap_or(0.0),
            row["duration"],
            row["id"].as_str().unwrap_or("-")
        );
    }
    println!();
    println!(
        "{} service(s), average price {:.2}",
        data["stats"]["total"],
        data["stats"]["average_price"].as_f64().unwrap_or(0.0)
    );
}

fn print_settings(data: &Value, format: &str) -> anyhow::Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(data)?);
        return Ok(());
    }

    println!("Address:  {}", data["address"].as_str().unwrap_or("-"));
    println!("WhatsApp: {}", data["whatsapp"].as_str().unwrap_or("-"));
    if let Some(hours) = data["business_hours"].as_array() {
        println!("Hours:");
        for hour in hours {
            println!(
                "  {:<16} {} - {}",
                hour["day"].as_str().unwrap_or("-"),
                hour["open"].as_str().unwrap_or("-"),
                hour["close"].as_str().unwrap_or("-")
            );
        }
    }
    if let Some(updated) = data["last_update"].as_str() {
        println!("Updated:  {}", updated);
    }
    Ok(())
}
