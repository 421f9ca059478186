use anyhow::Context;
use clap::Parser;
use modguard_classifiers::{load, Scorer};
use modguard_cli::cli::{Cli, Commands, OutputFormat};
use modguard_cli::interactive;
use modguard_cli::render::{render_html, render_json, ConsoleRenderer};
use modguard_cli::samples::{SampleCursor, SAMPLE_COMMENTS};
use modguard_cli::{build_config, read_comments};
use std::io::{self, IsTerminal};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match cli.command {
        Commands::Samples => {
            for (i, sample) in SAMPLE_COMMENTS.iter().enumerate() {
                println!("{:>2}. {}", i + 1, sample);
            }
        }

        Commands::Info => {
            let model = load(&build_config(&cli.global)?).context("Failed to load model")?;
            println!("{}", serde_json::to_string_pretty(model.metadata())?);
        }

        Commands::Score {
            text,
            file,
            format,
            no_color,
        } => {
            let input = read_comments(&text, file.as_deref()).context("Failed to read comments")?;
            let scorer = Scorer::new(
                load(&build_config(&cli.global)?).context("Failed to load model")?,
            );
            let batch = scorer.score_text(&input);
            info!(
                request_id = %batch.request_id,
                scored = batch.results.len(),
                "Scored comments"
            );

            match format {
                OutputFormat::Table => {
                    let renderer = ConsoleRenderer::new(use_color(no_color));
                    print!("{}", renderer.render(&batch));
                }
                OutputFormat::Json => println!("{}", render_json(&batch)?),
                OutputFormat::Html => println!("{}", render_html(&batch)),
            }
        }

        Commands::Interactive { no_color } => {
            let scorer = Scorer::new(
                load(&build_config(&cli.global)?).context("Failed to load model")?,
            );
            let renderer = ConsoleRenderer::new(use_color(no_color));
            let mut cursor = SampleCursor::default();

            interactive::run(io::stdin().lock(), &mut io::stdout(), &mut cursor, |text| {
                renderer.render(&scorer.score_text(text))
            })?;
        }
    }

    Ok(())
}

fn use_color(no_color: bool) -> bool {
    !no_color && io::stdout().is_terminal()
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "modguard=debug,modguard_cli=debug,modguard_classifiers=debug"
    } else {
        "modguard=info,modguard_cli=info,modguard_classifiers=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
