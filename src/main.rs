// Meteor Impact CLI

use std::process::ExitCode;

use meteor_impact::{run, AppState, CliOptions, SimulatorConfig, USAGE};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = match CliOptions::parse(std::env::args().skip(1)) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };
    if opts.help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let state = match SimulatorConfig::from_env().and_then(AppState::new) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Failed to initialize: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&state, &opts).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Failed to serialize report: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
