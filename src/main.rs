//! WinTrust CLI
//!
//! Command-line front end for the raffle client:
//! - browse raffles, their availability, status and winners
//! - check the backend's reachability
//! - run a purchase (preview mode uses the deterministic providers)

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use wintrust_client::models::{IdentityProof, Raffle};
use wintrust_client::services::{HealthMonitor, RaffleService};
use wintrust_client::{AppConfig, PurchaseFlow, Selection, SessionContext};

const USAGE: &str = "usage: wintrust <command>

commands:
  health                     check backend reachability
  raffles                    list raffles
  raffle <id>                show a raffle and its available numbers
  status <id>                show sale status
  winner <id>                show the winning number
  notifications <user-id>    list a user's raffles
  buy <id> <quantity>        buy random numbers (needs IDENTITY_PROOF unless PREVIEW_MODE)";

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("Configuration error")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("wintrust_client={},wintrust={},reqwest=warn", config.log_level, config.log_level).into()
            }),
        )
        .init();

    info!("Environment: {}", config.environment);
    info!("Backend: {}", config.api_url());
    if config.preview_mode {
        warn!("Preview mode enabled: identity proof and payment settlement are bypassed");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut session = SessionContext::new(config);

    if let (Ok(wallet), Ok(token)) = (std::env::var("WALLET_ADDRESS"), std::env::var("SESSION_TOKEN")) {
        session
            .sign_in(&wallet, &token)
            .await
            .context("Could not sign in")?;
    }

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["health"] => {
            let monitor = HealthMonitor::new(session.api().clone());
            if monitor.check_once().await {
                println!("backend reachable");
            } else {
                bail!("backend unreachable at {}", session.config().api_url());
            }
        }
        ["raffles"] => {
            let raffles = RaffleService::new(&session).list().await.map_err(user_error)?;
            for raffle in &raffles {
                print_summary(raffle);
            }
        }
        ["raffle", id] => {
            let service = RaffleService::new(&session);
            let raffle = service.get(id).await.map_err(user_error)?;
            print_summary(&raffle);
            let availability = raffle.availability();
            println!("  available:   {}", availability.available_labels().join(" "));
            println!("  unavailable: {}", availability.unavailable_labels().join(" "));
        }
        ["status", id] => {
            let detail = RaffleService::new(&session).status(id).await.map_err(user_error)?;
            println!(
                "{} [{}] {}/{} sold ({:.1}%), prize {}",
                detail.name,
                detail.status,
                detail.sold_count,
                detail.total_count,
                detail.percent_sold,
                detail.prize.summary()
            );
        }
        ["winner", id] => {
            let winner = RaffleService::new(&session).winner(id).await.map_err(user_error)?;
            println!("winning number {:02} ({})", winner.number, winner.nullifier_hash_masked);
        }
        ["notifications", user_id] => {
            let notifications = RaffleService::new(&session)
                .notifications(user_id)
                .await
                .map_err(user_error)?;
            for n in &notifications {
                let marker = if n.is_winner { " WINNER" } else { "" };
                println!("{} [{}] numbers {:?}{}", n.name, n.status, n.purchased_numbers, marker);
            }
        }
        ["buy", id, quantity] => {
            let quantity: usize = quantity.parse().context("quantity must be a number")?;
            buy(&mut session, id, quantity).await?;
        }
        _ => {
            eprintln!("{}", USAGE);
            bail!("unknown command");
        }
    }

    Ok(())
}

async fn buy(session: &mut SessionContext, id: &str, quantity: usize) -> Result<()> {
    if !session.is_preview() {
        let raw = std::env::var("IDENTITY_PROOF")
            .context("IDENTITY_PROOF must hold the wallet's proof JSON outside preview mode")?;
        let proof: IdentityProof =
            serde_json::from_str(&raw).context("IDENTITY_PROOF is not a valid proof")?;
        session.set_identity_proof(proof);
    }

    let raffle = RaffleService::new(session)
        .refresh(id)
        .await
        .map_err(user_error)?;

    let mut selection = Selection::new(raffle.id.clone(), quantity);
    selection.random_fill(quantity, &raffle.availability(), &mut rand::thread_rng());
    println!("selected numbers: {}", selection.labels().join(", "));
    println!(
        "total: {} {}",
        raffle.total_cost(selection.len()),
        session.config().payment.token_symbol
    );

    let flow = PurchaseFlow::for_session(session).map_err(user_error)?;
    let receipt = flow
        .confirm(session, &raffle, &mut selection)
        .await
        .map_err(user_error)?;

    println!(
        "purchased {} for {} {} (reference {})",
        receipt.numbers.join(", "),
        receipt.total_cost,
        receipt.token_symbol,
        receipt.reference
    );

    if let Some(request) = receipt.participation_request(flow.action()) {
        let response = RaffleService::new(session)
            .participate(&request)
            .await
            .map_err(user_error)?;
        println!("{} (numbers {:?})", response.message, response.assigned_numbers);
    }

    Ok(())
}

fn print_summary(raffle: &Raffle) {
    let availability = raffle.availability();
    println!(
        "{}  {} [{}] {} per number, {}/{} left, prize {}",
        raffle.id,
        raffle.name,
        raffle.status().as_str(),
        raffle.config.price_per_number,
        availability.available.len(),
        availability.total,
        raffle.prize.summary()
    );
}

fn user_error(err: wintrust_client::AppError) -> anyhow::Error {
    anyhow::anyhow!("{} ({})", err.user_message(), err)
}
