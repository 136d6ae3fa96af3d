//! `eod-sim` command line

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use eod_core::{telemetry, LogFormat, ManagerConfig};
use eod_sim::{run_simulator, EffectiveConfig, SimulatorConfig};
use std::path::PathBuf;
use std::process::ExitCode;

fn cli() -> Command {
    Command::new("eod-sim")
        .version(eod_sim::VERSION)
        .about("EOD configuration checker and voting simulator")
        .arg(
            Arg::new("log")
                .long("log")
                .global(true)
                .default_value("warn")
                .help("Log filter directive (RUST_LOG wins when set)"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Log line format"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("check-config")
                .about("Validate a TOML config and print the effective rulesets as JSON")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Config file"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run seeded concurrent voting across communities")
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("communities")
                        .long("communities")
                        .default_value("4")
                        .value_parser(value_parser!(u64).range(1..=256))
                        .help("Communities simulated side by side"),
                )
                .arg(
                    Arg::new("users")
                        .long("users")
                        .default_value("12")
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Voters per community"),
                )
                .arg(
                    Arg::new("polls")
                        .long("polls")
                        .default_value("40")
                        .value_parser(value_parser!(u64))
                        .help("Polls proposed per community"),
                )
                .arg(
                    Arg::new("vote-req")
                        .long("vote-req")
                        .default_value("3")
                        .value_parser(value_parser!(usize))
                        .help("Votes needed to accept"),
                )
                .arg(
                    Arg::new("reject-req")
                        .long("reject-req")
                        .value_parser(value_parser!(usize))
                        .help("Downvotes needed to reject (off when omitted)"),
                )
                .arg(
                    Arg::new("poll-limit")
                        .long("poll-limit")
                        .default_value("8")
                        .value_parser(value_parser!(usize))
                        .help("Maximum pending polls per community"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop a community at its first violation"),
                ),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = cli().get_matches();

    let filter = matches.get_one::<String>("log").map_or("warn", String::as_str);
    let format: LogFormat = matches
        .get_one::<String>("log-format")
        .map_or("text", String::as_str)
        .parse()?;
    telemetry::init(filter, format)?;

    match matches.subcommand() {
        Some(("check-config", args)) => {
            let path = args
                .get_one::<PathBuf>("path")
                .context("missing config path")?;
            let config = ManagerConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?;
            let effective = EffectiveConfig::resolve(&config)?;
            println!("{}", effective.to_json()?);
            Ok(ExitCode::SUCCESS)
        }
        Some(("simulate", args)) => {
            let defaults = SimulatorConfig::default();
            let config = SimulatorConfig {
                seed: args.get_one::<u64>("seed").copied().unwrap_or(defaults.seed),
                communities: args.get_one::<u64>("communities").copied().unwrap_or(defaults.communities),
                users: args.get_one::<u64>("users").copied().unwrap_or(defaults.users),
                polls: args.get_one::<u64>("polls").copied().unwrap_or(defaults.polls),
                vote_req: args.get_one::<usize>("vote-req").copied().unwrap_or(defaults.vote_req),
                reject_req: args.get_one::<usize>("reject-req").copied(),
                poll_limit: args.get_one::<usize>("poll-limit").copied().unwrap_or(defaults.poll_limit),
                stop_on_first_violation: args.get_flag("stop-on-violation"),
            };
            config
                .game_config()
                .validate()
                .context("simulated ruleset is invalid")?;

            println!("Running EOD simulator...");
            println!("Seed: {}", config.seed);
            println!("Communities: {}", config.communities);
            println!();

            let report = run_simulator(config).await;
            println!("{}", report.generate_text());
            Ok(if report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        _ => Ok(ExitCode::FAILURE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn simulate_defaults_parse() {
        let matches = cli().try_get_matches_from(["eod-sim", "simulate"]).unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<u64>("seed"), Some(&42));
        assert_eq!(args.get_one::<usize>("reject-req"), None);
    }

    #[test]
    fn zero_communities_refused() {
        assert!(cli()
            .try_get_matches_from(["eod-sim", "simulate", "--communities", "0"])
            .is_err());
    }
}
