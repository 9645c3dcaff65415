use anyhow::Result;
use clap::Parser as _;
use pursuit_core::Participant;
use pursuit_experiment::{SessionManifest, TrackingLog};

mod app;
mod cli;
mod headless;

use app::App;
use cli::Arguments;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let args = Arguments::parse();
    let config = args.config();
    config.validate()?;

    println!("=== PURSUIT TRACKER ===");
    println!("Platform: {}", std::env::consts::OS);
    println!("Architecture: {}", std::env::consts::ARCH);

    let mut tracking_log = TrackingLog::create(&config.out_csv)?;
    let cli_participant = args.participant();
    let mut manifest = SessionManifest::new(
        cli_participant.clone().unwrap_or_else(Participant::anonymous),
        config.clone(),
        if args.headless { "headless" } else { "gui" },
    );

    let (mode, participant, trials, stats) = if args.headless {
        let participant = cli_participant.unwrap_or_else(Participant::anonymous);
        let outcome =
            headless::run(&config, &participant, &mut tracking_log, args.simulated_clock)?;
        outcome.report();
        ("headless", participant, outcome.trials, outcome.stats)
    } else {
        println!("Enter participant info, then track the red target with the mouse.\n");
        let gui = App::new(
            config.clone(),
            cli_participant.clone(),
            args.font.clone(),
            args.fullscreen,
            &mut tracking_log,
        )
        .run();
        match gui {
            Ok(outcome) => {
                if let Some(e) = outcome.log_error {
                    return Err(e);
                }
                let participant = outcome.participant.unwrap_or_else(Participant::anonymous);
                ("gui", participant, outcome.trials, outcome.stats)
            }
            Err(e) => {
                println!(
                    "GUI mode failed or unavailable, falling back to headless. Error: {:#}",
                    e
                );
                let participant = cli_participant.unwrap_or_else(Participant::anonymous);
                let outcome =
                    headless::run(&config, &participant, &mut tracking_log, args.simulated_clock)?;
                outcome.report();
                ("headless", participant, outcome.trials, outcome.stats)
            }
        }
    };

    let rows = tracking_log.finish()?;

    manifest.participant = participant;
    manifest.mode = mode.to_string();
    manifest.finish(trials, rows, &stats);
    let manifest_path = SessionManifest::path_for(&config.out_csv);
    match manifest.save(&manifest_path) {
        Ok(()) => log::info!("Session manifest written to {}", manifest_path.display()),
        Err(e) => log::warn!("Could not write session manifest: {:#}", e),
    }

    Ok(())
}
