use advisor_research::cli::output::{Output, Verdict};
use advisor_research::cli::{Cli, Commands};
use advisor_research::routing::{classify, Selector, Toggles};
use advisor_research::utils::logging::init_tracing;
use advisor_research::utils::toml_config::{ConfigError, ResearchConfig};
use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be loaded before toggles read the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = Output::new(!cli.no_color);

    if let Commands::Config { validate: true } = cli.command {
        return validate_config(&cli, &output);
    }

    let mut config = ResearchConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_tracing(&config.logging)?;

    let toggles = Toggles::resolve(&config.toggles);

    match cli.command {
        Commands::Classify { text } => {
            let intent = classify(&text);
            println!("{}", serde_json::to_string_pretty(&intent)?);
        }
        Commands::Route {
            texts,
            policy,
            mode,
            json,
        } => {
            let mut selector = Selector::from_config(toggles, &config.routing);
            if let Some(policy) = policy {
                selector = selector.with_policy(policy);
            }
            if let Some(mode) = mode {
                selector = selector.with_mode(mode);
            }

            for prompt in Cli::prompts(&texts) {
                let decision = selector.route_heuristic(&prompt);
                if json {
                    let record = serde_json::json!({ "prompt": prompt, "routing": decision });
                    println!("{}", serde_json::to_string_pretty(&record)?);
                } else {
                    output.decision(&prompt, &decision);
                }
            }
            if !json {
                println!();
            }
        }
        Commands::Config { .. } => {
            output.configuration(&cli.config, &config, &toggles);
            println!();
        }
    }

    Ok(())
}

fn validate_config(cli: &Cli, output: &Output) -> anyhow::Result<()> {
    match ResearchConfig::load(&cli.config) {
        Ok(_) => {
            output.verdict(Verdict::Valid, &format!("{} is valid", cli.config.display()));
            Ok(())
        }
        Err(ConfigError::FileNotFound(path)) => {
            let message = format!("{} not found, defaults apply", path.display());
            output.verdict(Verdict::Defaulted, &message);
            Ok(())
        }
        Err(e) => {
            output.verdict(Verdict::Invalid, &e.to_string());
            Err(e.into())
        }
    }
}
