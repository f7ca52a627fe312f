use crate::book_file::BookFile;
use anyhow::{Context, Result};
use clap::ArgMatches;
use console::style;
use keypoint_config::{Config, ConfigManager};
use keypoint_core::BookSummary;
use std::path::{Path, PathBuf};


/// Picks the config file named by `--config`, or the platform default
pub fn config_manager(matches: &ArgMatches) -> Result<ConfigManager> {
    match matches.get_one::<String>("config") {
        Some(path) => Ok(ConfigManager::with_file(PathBuf::from(path))),
        None => ConfigManager::new().context("Failed to locate config directory"),
    }
}

/// Loads the config, falling back to defaults when the file is unusable
pub fn load_config(manager: &ConfigManager) -> Config {
    manager.load_with_env_overrides().unwrap_or_else(|e| {
        eprintln!(
            "{} Config error: {}, using defaults",
            style("!").yellow().bold(),
            e
        );
        Config::default()
    })
}

/// Validate a book file and list its key points
pub fn check_book(matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("book")
        .ok_or_else(|| anyhow::anyhow!("Book file is required"))?;

    let (book, product) = BookFile::load(Path::new(path))?.into_parts()?;

    println!("{} {} is valid", style("✓").green().bold(), path);
    print_book_summary(&book);
    println!(
        "  Product: {} ({})",
        product.display_name, product.display_price
    );

    Ok(())
}

/// Write a default config file unless one exists
pub fn config_init(manager: &ConfigManager) -> Result<()> {
    let created = manager
        .initialize()
        .context("Failed to initialize config")?;

    if created {
        println!(
            "{} Config written to {}",
            style("✓").green().bold(),
            manager.config_path().display()
        );
    } else {
        println!(
            "Config already exists at {}",
            manager.config_path().display()
        );
    }
    Ok(())
}

/// Print the effective config as TOML
pub fn config_show(manager: &ConfigManager) -> Result<()> {
    let config = manager
        .load_with_env_overrides()
        .context("Failed to load config")?;
    print!("{}", render_config(&config)?);

    let warnings = manager.validate().context("Failed to validate config")?;
    for warning in warnings {
        eprintln!("{} {}", style("warning:").yellow().bold(), warning);
    }
    Ok(())
}

pub fn config_path(manager: &ConfigManager) -> Result<()> {
    println!("{}", manager.config_path().display());
    Ok(())
}

fn render_config(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}

fn print_book_summary(book: &BookSummary) {
    println!("\n{}", style(&book.title).bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  Purchase id: {}", book.purchase_id);
    println!(
        "  Key points: {} ({})",
        book.chapter_count(),
        book.total_duration().as_hms()
    );

    for (index, chapter) in book.chapters().iter().enumerate() {
        println!(
            "  {:>3}. {} {}",
            index + 1,
            chapter.title,
            style(chapter.duration.as_clock()).dim()
        );
    }
}
