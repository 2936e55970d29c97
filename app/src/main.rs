use anyhow::Context;
use clap::Parser;
use pagesight_app::args::{AskArgs, Cli, Commands, ServeArgs};
use pagesight_app::routes::AskResponse;
use pagesight_app::{init_tracing, startup::run};
use pagesight_core::AppConfig;
use pagesight_pipeline::Pipeline;
use std::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = AppConfig::load_with_env(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve(args) => serve(config, args).await,
        Commands::Ask(args) => ask(config, args).await,
    }
}

async fn serve(mut config: AppConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let pipeline = Pipeline::from_config(&config).context("Failed to set up model provider")?;

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener =
        TcpListener::bind(&address).with_context(|| format!("Failed to bind {address}"))?;

    info!(
        "Starting Pagesight v{} on http://{} (provider: {}, model: {})",
        env!("CARGO_PKG_VERSION"),
        address,
        config.llm.provider,
        config.llm.model
    );

    run(listener, pipeline)?.await?;
    Ok(())
}

async fn ask(mut config: AppConfig, args: AskArgs) -> anyhow::Result<()> {
    if let Some(max) = args.max_captcha_attempts {
        config.pipeline.max_captcha_attempts = max;
    }

    let pipeline = Pipeline::from_config(&config).context("Failed to set up model provider")?;

    let result = pipeline
        .process_query(&args.url, &args.query)
        .await
        .with_context(|| format!("Failed to answer query for {}", args.url))?;

    if args.json {
        let response = AskResponse {
            url: args.url,
            query: args.query,
            answer: result.answer,
            reasoning: result.reasoning,
            html_element: result.html_element,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", result.answer);
        if let Some(element) = result.html_element {
            println!("\nElement: {element}");
        }
        println!("\nReasoning: {}", result.reasoning);
    }

    Ok(())
}
