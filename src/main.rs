use clap::{Arg, ArgMatches, Command};
use notion_translate::config::{DEFAULT_CREDENTIALS_FILE, parse_create_mode, parse_yes};
use notion_translate::{
    Credentials, GoogleTranslateProvider, MockMode, MockTranslator, NotionClient, RunConfig,
    Synchronizer, TextTranslator, page_id_from_url,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` when set and valid; otherwise `info`, or `debug` with `--verbose`.
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{}: ", message);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Flag value if given, otherwise ask.
fn value_or_prompt(matches: &ArgMatches, id: &str, message: &str) -> io::Result<String> {
    match matches.get_one::<String>(id) {
        Some(value) => Ok(value.trim().to_string()),
        None => prompt(message),
    }
}

fn build_config(matches: &ArgMatches) -> Result<RunConfig, Box<dyn std::error::Error>> {
    let mode = value_or_prompt(matches, "mode", "Create or remove translations? (c/r)")?;
    if !parse_create_mode(&mode)? {
        let subpages = value_or_prompt(matches, "subpages", "Include sub-pages? (y/n)")?;
        return Ok(RunConfig::revert().with_subpages(parse_yes(&subpages)));
    }

    let source = value_or_prompt(
        matches,
        "source",
        "Source language (leave blank to auto-detect)",
    )?;
    let target = value_or_prompt(matches, "target", "Target language")?;
    if target.is_empty() {
        return Err("a target language is required".into());
    }
    let realtime = value_or_prompt(matches, "realtime", "Translate in realtime? (y/n)")?;
    let subpages = value_or_prompt(matches, "subpages", "Include sub-pages? (y/n)")?;

    let source = Some(source).filter(|s| !s.is_empty());
    Ok(RunConfig::create(source, Some(target))
        .with_realtime(parse_yes(&realtime))
        .with_subpages(parse_yes(&subpages)))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("notion-translate")
        .version("0.1.0")
        .about("Keep machine translations of a Notion page in sync")
        .arg(
            Arg::new("page")
                .help("Notion page URL or id")
                .index(1),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .help("'c' to create translations, 'r' to remove them"),
        )
        .arg(
            Arg::new("source")
                .long("source")
                .short('s')
                .help("Source language code (blank to auto-detect)"),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .short('t')
                .help("Target language code (e.g., ko, fr, de)"),
        )
        .arg(
            Arg::new("realtime")
                .long("realtime")
                .short('r')
                .help("Only translate recent edits and keep polling (y/n)")
                .num_args(0..=1)
                .default_missing_value("y"),
        )
        .arg(
            Arg::new("subpages")
                .long("subpages")
                .help("Also process the contents of sub-pages (y/n)")
                .num_args(0..=1)
                .default_missing_value("y"),
        )
        .arg(
            Arg::new("credentials")
                .long("credentials")
                .short('c')
                .help("Credentials file")
                .default_value(DEFAULT_CREDENTIALS_FILE),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use mock translator instead of Google Translate")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log every node that is touched")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), matches.get_flag("verbose")))
        .init();

    let credentials_path = matches
        .get_one::<String>("credentials")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE));
    let credentials =
        Credentials::resolve_with(&credentials_path, &Credentials::from_env(), prompt)?;

    let page = value_or_prompt(&matches, "page", "Notion page URL")?;
    let page_id = page_id_from_url(&page).ok_or("could not find a page id in the given URL")?;
    let config = build_config(&matches)?;

    let store = NotionClient::new(credentials.notion_key()?)?;
    let translator: Arc<dyn TextTranslator> = if matches.get_flag("mock") {
        Arc::new(MockTranslator::new(MockMode::Suffix))
    } else {
        Arc::new(GoogleTranslateProvider::new(
            credentials.google_key()?.to_string(),
        )?)
    };

    info!(
        page_id = %page_id,
        create = config.is_create(),
        realtime = config.realtime,
        subpages = config.include_subpages,
        "starting"
    );
    let sync = Synchronizer::new(Arc::new(store), translator, config);

    if sync.config().is_continuous() {
        sync.run_forever(&page_id).await;
    } else {
        let report = sync.run_once(&page_id).await?;
        println!(
            "{} of {} nodes changed ({} failed)",
            report.changed(),
            report.nodes,
            report.failed
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_log_filter_defaults() {
        assert_eq!(log_filter(None, false).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(None, true).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(Some("  "), false).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_log_filter_rust_log_is_not_lowered() {
        assert_eq!(
            log_filter(Some("trace"), false).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
        assert_eq!(
            log_filter(Some("trace"), true).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
        assert_eq!(
            log_filter(Some("warn"), true).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }
}
