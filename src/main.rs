use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::{info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ltv::classifier::HeaderKeywords;
use ltv::controller::Controller;
use ltv::domain::{DatasetSpec, LTVConfig, LTVError, Result};
use ltv::model::{Model, Status};
use ltv::parser::Delimiter;
use ltv::pipeline::Dataset;
use ltv::render;
use ltv::source::{DataSource, FileSource};
use ltv::ui::TableUI;

/// A terminal viewer for log-like CSV/TSV files.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Files to show, one section each
    #[arg(required = true)]
    files: Vec<String>,

    /// Fixed header for a dataset, e.g. `s2=Timestamp,Type,Route`
    #[arg(short, long = "lock", value_name = "NAME=COL1,COL2,..", value_parser = parse_lock)]
    locks: Vec<(String, Vec<String>)>,

    /// Field delimiter (comma, tab or a single char), detected when omitted
    #[arg(short, long)]
    delimiter: Option<Delimiter>,

    /// Column names that mark the header row
    #[arg(short, long, value_delimiter = ',')]
    keywords: Option<Vec<String>>,

    /// Print every dataset as an HTML table and exit
    #[arg(long)]
    html: bool,

    /// Log file, the terminal belongs to the UI
    #[arg(long, default_value = "ltv.log")]
    log_file: PathBuf,

    /// Event poll timeout in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Upper bound for column widths
    #[arg(long, default_value_t = 40)]
    max_column_width: usize,
}

fn parse_lock(s: &str) -> Result<(String, Vec<String>)> {
    let (name, columns) = s
        .split_once('=')
        .ok_or_else(|| LTVError::InvalidLockSpec(s.to_string()))?;
    let columns: Vec<String> = columns
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if name.trim().is_empty() || columns.is_empty() {
        return Err(LTVError::InvalidLockSpec(s.to_string()));
    }
    Ok((name.trim().to_string(), columns))
}

fn dataset_name(locator: &str) -> String {
    Path::new(locator)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(locator)
        .to_string()
}

fn build_config(args: &Args) -> LTVConfig {
    let keywords = args
        .keywords
        .as_ref()
        .map(HeaderKeywords::new)
        .unwrap_or_default();

    let datasets: Vec<DatasetSpec> = args
        .files
        .iter()
        .map(|locator| {
            let name = dataset_name(locator);
            let mut spec = DatasetSpec::new(name.clone(), locator.clone())
                .with_keywords(keywords.clone());
            if let Some(d) = args.delimiter {
                spec = spec.with_delimiter(d.as_char());
            }
            if let Some((_, columns)) = args.locks.iter().rev().find(|(n, _)| *n == name) {
                spec = spec.with_locked_header(columns.clone());
            }
            spec
        })
        .collect();

    for (name, _) in &args.locks {
        if !datasets.iter().any(|d| &d.name == name) {
            warn!("--lock for unknown dataset '{name}'");
        }
    }

    LTVConfig {
        event_poll_time: args.poll_ms,
        max_column_width: args.max_column_width,
        datasets,
    }
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| LTVError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ltv=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(args: Args) -> Result<()> {
    init_logging(&args.log_file)?;
    let config = build_config(&args);
    let source = FileSource::new();
    info!("Starting ltv with {} dataset(s)", config.datasets.len());

    if args.html {
        for spec in config.datasets.iter().cloned() {
            let dataset = Dataset::load(&source, spec);
            println!("<section id=\"{}\">", render::escape_html(&dataset.spec.name));
            println!("{}", dataset.rendered.to_html());
            println!("</section>");
        }
        return Ok(());
    }

    let mut terminal = ratatui::init();
    let result = event_loop(&config, &source, &mut terminal);
    ratatui::restore();
    result
}

fn event_loop(
    config: &LTVConfig,
    source: &dyn DataSource,
    terminal: &mut ratatui::DefaultTerminal,
) -> Result<()> {
    let size = terminal.size()?;
    let mut model = Model::init(config, source, size.width as usize, size.height as usize);
    let mut ui = TableUI::new();
    let controller = Controller::new(config);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message);
    }
    info!("Quitting ltv");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_spec() {
        assert_eq!(
            parse_lock("s2=Timestamp, Type,Route").unwrap(),
            ("s2".to_string(), vec!["Timestamp".into(), "Type".into(), "Route".into()])
        );
        assert!(parse_lock("s2").is_err());
        assert!(parse_lock("=a,b").is_err());
        assert!(parse_lock("s2=").is_err());
    }

    #[test]
    fn config_from_args() {
        let args = Args::parse_from([
            "ltv",
            "data/s1.csv",
            "data/s2.tsv",
            "--lock",
            "s2=Timestamp,Route",
            "-d",
            "tab",
            "-k",
            "date,kind",
        ]);
        let config = build_config(&args);
        assert_eq!(config.datasets.len(), 2);
        assert_eq!(config.datasets[0].name, "s1");
        assert_eq!(config.datasets[0].locked_header, None);
        assert_eq!(config.datasets[0].delimiter, Some('\t'));
        assert_eq!(
            config.datasets[1].locked_header,
            Some(vec!["Timestamp".to_string(), "Route".to_string()])
        );
        assert_eq!(config.datasets[1].keywords, HeaderKeywords::new(["date", "kind"]));
    }
}
