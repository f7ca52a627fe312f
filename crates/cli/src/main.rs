use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use keypoint_config::{Config, LogLevel};
use std::path::Path;

mod book_file;
mod commands;
mod player;

fn build_cli() -> Command {
    Command::new("keypoint")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Listen to book summaries one key point at a time")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Path to the config file")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Override the configured log level")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .global(true),
        )
        .subcommand(
            Command::new("play")
                .about("Play a book summary")
                .arg(Arg::new("book").required(true).value_name("BOOK.toml").help("Path to the book file"))
                .arg(
                    Arg::new("purchased")
                        .long("purchased")
                        .help("Start with the book's subscription already active")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Validate a book file and list its key points")
                .arg(Arg::new("book").required(true).value_name("BOOK.toml").help("Path to the book file")),
        )
        .subcommand(
            Command::new("config")
                .about("Manage the config file")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Write a default config file"))
                .subcommand(Command::new("show").about("Print the effective config"))
                .subcommand(Command::new("path").about("Print the config file location")),
        )
}

fn log_level(matches: &ArgMatches, config: &Config) -> LogLevel {
    matches
        .get_one::<String>("log-level")
        .and_then(|level| level.parse().ok())
        .unwrap_or(config.app.log_level)
}

async fn play(matches: &ArgMatches, config: &Config) -> Result<()> {
    let path = matches
        .get_one::<String>("book")
        .ok_or_else(|| anyhow::anyhow!("Book file is required"))?;
    let (book, product) = book_file::BookFile::load(Path::new(path))?
        .into_parts()
        .context("Book file failed validation")?;

    log::info!(
        "Opening {} with {} key points",
        book.title,
        book.chapter_count()
    );
    player::start_playback(book, product, config, matches.get_flag("purchased")).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let manager = commands::config_manager(&matches)?;
    let config = commands::load_config(&manager);

    let level = log_level(&matches, &config);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.to_string()))
        .init();

    match matches.subcommand() {
        Some(("play", sub_matches)) => play(sub_matches, &config).await,
        Some(("check", sub_matches)) => commands::check_book(sub_matches),
        Some(("config", sub_matches)) => match sub_matches.subcommand() {
            Some(("init", _)) => commands::config_init(&manager),
            Some(("show", _)) => commands::config_show(&manager),
            Some(("path", _)) => commands::config_path(&manager),
            _ => {
                build_cli().print_help()?;
                Ok(())
            }
        },
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
