use anyhow::Context;
use ragline::cli::{commands, output::Output, Cli, Commands};
use ragline::utils::toml_config::RagConfig;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(level: &str, verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli, output: &Output) -> anyhow::Result<()> {
    let config = RagConfig::discover(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(
        &config.logging.level,
        cli.verbose,
        cli.log_json || config.logging.json,
    );

    match cli.command {
        Commands::Clean {
            input,
            output: path,
        } => commands::clean(&input, &path, &config, output)
            .await
            .with_context(|| format!("Failed to clean {}", input.display()))?,

        Commands::Chunk {
            input,
            output: path,
            max_words,
        } => {
            commands::chunk(&input, path, max_words, &config, output)
                .await
                .with_context(|| format!("Failed to chunk {}", input.display()))?;
        }

        Commands::Index {
            chunks,
            output: path,
        } => commands::index(chunks, path, &config, output)
            .await
            .context("Failed to build the index")?,

        Commands::Ingest { input, max_words } => commands::ingest(&input, max_words, &config, output)
            .await
            .with_context(|| format!("Failed to ingest {}", input.display()))?,

        Commands::Search {
            query,
            k,
            preview_chars,
        } => commands::search(&query, k, preview_chars, &config, output)
            .await
            .context("Search failed")?,

        Commands::Ask { question } => commands::ask(&question, &config, output)
            .await
            .context("Failed to answer the question")?,

        Commands::Chat => commands::chat(&config, output)
            .await
            .context("Chat session ended with an error")?,

        Commands::Config { validate } => {
            commands::show_config(&config, validate, output).context("Invalid configuration")?
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match run(cli, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
