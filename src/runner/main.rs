use log::*;
use wsnsim::SimConfig;

mod data_collection;
mod scenario;

use scenario::Scenario;

fn main() {
    env_logger::init();

    let config = match std::env::var("CONFIG_FILE") {
        Ok(_) => match SimConfig::from_env() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load config: {e}");
                std::process::exit(1);
            }
        },
        Err(_) => {
            info!("CONFIG_FILE not set, using defaults");
            SimConfig::default()
        }
    };

    let mut scenario = match Scenario::new(config) {
        Ok(scenario) => scenario,
        Err(e) => {
            error!("Invalid scenario: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = scenario.run() {
        error!("Failed to save results: {e}");
        std::process::exit(1);
    }
}
