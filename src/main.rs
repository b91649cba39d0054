use std::env;

use tiny_reducer_actor::pie_shop::{CustomerMsg, Outcome, PieShop};
use tiny_reducer_actor::{ActorSystem, SystemConfig};
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

const DEFAULT_SLICES: &str = "apple,cherry,pecan";
const CUSTOMERS: [&str; 2] = ["alice", "bob"];
const ROUNDS: usize = 5;

fn pie_slices() -> Vec<String> {
    env::var("PIE_SLICES")
        .unwrap_or_else(|_| DEFAULT_SLICES.to_string())
        .split(',')
        .map(|slice| slice.trim().to_string())
        .filter(|slice| !slice.is_empty())
        .collect()
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = SystemConfig::from_env();
    log::info!("Starting actor system: {:?}", config);
    let system = ActorSystem::start(config).expect("Failed to start actor system");

    system.on_dead_letter(|letter| {
        log::warn!("Undeliverable: {:?}", letter);
    });

    let (observer, mut outcomes) = mpsc::unbounded_channel();
    let shop = PieShop::open(&system, pie_slices(), Some(observer)).expect("Failed to open shop");

    let customers = CUSTOMERS
        .iter()
        .map(|name| shop.seat(name))
        .collect::<Result<Vec<_>, _>>()
        .expect("Failed to seat customers");

    for round in 0..ROUNDS {
        let customer = &customers[round % customers.len()];
        if let Err(e) = customer.tell(CustomerMsg::HungryForPie) {
            log::error!("Could not reach {}: {}", customer.path(), e);
        }
    }

    let mut served = 0;
    let mut sulked = 0;
    for _ in 0..ROUNDS {
        match timeout(Duration::from_secs(5), outcomes.recv()).await {
            Ok(Some(Outcome::Served { customer, food })) => {
                served += 1;
                println!("{customer} got a slice of {food}");
            }
            Ok(Some(Outcome::Sulked { customer, reason })) => {
                sulked += 1;
                println!("{customer} got nothing: {reason}");
            }
            Ok(None) | Err(_) => {
                log::error!("Gave up waiting for the kitchen");
                break;
            }
        }
    }

    match shop.tally(Duration::from_secs(1)).await {
        Ok(tally) => log::info!(
            "Waiter served {} orders and refused {}",
            tally.served,
            tally.refused
        ),
        Err(e) => log::error!("Waiter did not answer: {}", e),
    }
    println!("{served} served, {sulked} sent away");

    if let Err(e) = system.stop_all().await {
        log::error!("Failed to stop actor system: {}", e);
    }
}
