//! Flight delay prediction - main entry point

use clap::Parser;
use flight_delay::cli::{cmd_evaluate, cmd_predict, cmd_preprocess, cmd_serve, cmd_train, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flight_delay=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let store = cli.store();

    match cli.command {
        Commands::Preprocess { data, sample, feature_set } => {
            cmd_preprocess(store, &data, sample, &feature_set)?;
        }
        Commands::Train { model, n_estimators, max_depth } => {
            cmd_train(store, &model, n_estimators, max_depth)?;
        }
        Commands::Predict { model, data, sample_size, output } => {
            cmd_predict(store, &model, &data, sample_size, output.as_deref())?;
        }
        Commands::Evaluate => {
            cmd_evaluate(store)?;
        }
        Commands::Serve { port, host } => {
            cmd_serve(store, host, port).await?;
        }
    }

    Ok(())
}
