use anyhow::Result;
use kinopass::cli::{self, CliArgs};
use kinopass::context::{AppContext, StandardContext};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::env;
use std::fs::OpenOptions;

fn init_logging(args: &CliArgs) {
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("kinopass")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));

    // Keep a debug log next to the cache so reminder issues can be traced after the fact
    let ctx = StandardContext::new(args.root.clone());
    if let Some(path) = ctx.get_log_path()
        && let Ok(file) = OpenOptions::new().create(true).append(true).open(&path)
    {
        loggers.push(WriteLogger::new(LevelFilter::Debug, config, file));
    }

    let _ = CombinedLogger::init(loggers);
}

#[tokio::main]
async fn main() -> Result<()> {
    let raw: Vec<String> = env::args().skip(1).collect();
    let args = match cli::parse_args(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            cli::print_help("kinopass");
            std::process::exit(2);
        }
    };

    init_logging(&args);
    cli::run(args).await
}
