use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use tracing::{info, warn};

use comic_prompt_helper::analysis::{Analysis, Analyzer, FallbackAnalyzer};
use comic_prompt_helper::config::{Config, LlmOverride};
use comic_prompt_helper::generator::{GenerationMode, GenerationRequest, PromptGenerator};
use comic_prompt_helper::mapping::{VisualMapper, DEFAULT_STYLE};
use comic_prompt_helper::utils::logging::init_logging;

#[derive(Debug)]
enum CliCommand {
    Generate(GenerateArgs),
    Styles,
    Help,
}

#[derive(Debug, Default)]
struct GenerateArgs {
    text: Option<String>,
    file: Option<PathBuf>,
    analysis: Option<PathBuf>,
    mode: GenerationMode,
    panels: Option<u32>,
    style: Option<String>,
    sensitive_filter: bool,
    language: Option<String>,
    llm_override: LlmOverride,
}

fn usage() -> String {
    format!(
        "Usage:\n  \
         comic_prompt_helper generate (--text <text> | --file <path>) [--analysis <json>] [--mode <{}>] \
         [--panels <n>] [--style <name>] [--no-sensitive-filter] [--language <name|auto>] \
         [--api-base <url>] [--api-key <key>] [--model <name>]\n  \
         comic_prompt_helper styles",
        GenerationMode::labels().join("|")
    )
}

fn take_value<'a>(args: &'a [String], index: &mut usize, flag: &str) -> Result<&'a str> {
    *index += 1;
    args.get(*index)
        .map(|value| value.as_str())
        .ok_or_else(|| anyhow!("Missing value for {flag}"))
}

fn parse_generate_args(args: &[String]) -> Result<GenerateArgs> {
    let mut parsed = GenerateArgs {
        sensitive_filter: true,
        ..GenerateArgs::default()
    };

    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--text" => parsed.text = Some(take_value(args, &mut index, "--text")?.to_string()),
            "--file" => parsed.file = Some(PathBuf::from(take_value(args, &mut index, "--file")?)),
            "--analysis" => {
                parsed.analysis = Some(PathBuf::from(take_value(args, &mut index, "--analysis")?))
            }
            "--mode" => {
                parsed.mode = GenerationMode::from_label(take_value(args, &mut index, "--mode")?)
            }
            "--panels" => {
                let value = take_value(args, &mut index, "--panels")?;
                parsed.panels = Some(
                    value
                        .parse::<u32>()
                        .map_err(|_| anyhow!("Invalid --panels value: {value}"))?,
                );
            }
            "--style" => parsed.style = Some(take_value(args, &mut index, "--style")?.to_string()),
            "--no-sensitive-filter" => parsed.sensitive_filter = false,
            "--language" => {
                parsed.language = Some(take_value(args, &mut index, "--language")?.to_string())
            }
            "--api-base" => {
                parsed.llm_override.base_url =
                    Some(take_value(args, &mut index, "--api-base")?.to_string())
            }
            "--api-key" => {
                parsed.llm_override.api_key =
                    Some(take_value(args, &mut index, "--api-key")?.to_string())
            }
            "--model" => {
                parsed.llm_override.model =
                    Some(take_value(args, &mut index, "--model")?.to_string())
            }
            other => {
                return Err(anyhow!(
                    "Unknown generate argument: {other}\n{}",
                    usage()
                ));
            }
        }
        index += 1;
    }

    if parsed.text.is_some() == parsed.file.is_some() {
        return Err(anyhow!(
            "Exactly one of --text or --file is required\n{}",
            usage()
        ));
    }
    Ok(parsed)
}

fn parse_cli(args: &[String]) -> Result<CliCommand> {
    match args.get(1).map(|value| value.as_str()) {
        Some("generate") => Ok(CliCommand::Generate(parse_generate_args(&args[2..])?)),
        Some("styles") => Ok(CliCommand::Styles),
        Some("--help") | Some("-h") | Some("help") | None => Ok(CliCommand::Help),
        Some(other) => Err(anyhow!("Unknown command: {other}\n{}", usage())),
    }
}

fn load_analysis(args: &GenerateArgs, text: &str) -> Result<Analysis> {
    let Some(path) = &args.analysis else {
        return Ok(FallbackAnalyzer.analyze(text));
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read analysis file {}", path.display()))?;
    let analysis = Analysis::from_json(&raw)
        .with_context(|| format!("Failed to parse analysis file {}", path.display()))?;
    if let Some(error) = &analysis.error {
        warn!("Analyzer reported an error, continuing with partial data: {}", error);
    }
    Ok(analysis)
}

async fn run_generate(args: GenerateArgs, config: &Config) -> Result<()> {
    let text = match (&args.text, &args.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display()))?,
        (None, None) => return Err(anyhow!("No input text provided")),
    };
    let analysis = load_analysis(&args, &text)?;

    let mapper = Arc::new(VisualMapper::new(&config.mapping_paths));
    let generator = PromptGenerator::new(mapper, config.llm.clone());

    let request = GenerationRequest {
        text,
        analysis,
        mode: args.mode,
        panels: args.panels.unwrap_or(2),
        style: args.style.unwrap_or_else(|| DEFAULT_STYLE.to_string()),
        sensitive_filter: args.sensitive_filter,
        llm_override: args.llm_override,
        language: args.language,
    };
    info!(
        "Generating prompt: mode={} style={} panels={}",
        request.mode.as_str(),
        request.style,
        request.panels
    );

    let prompt = generator.generate(&request).await;
    println!("{prompt}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let config = Config::load()?;
    let _guards = init_logging(&config.log_dir, &config.log_level);

    let args: Vec<String> = std::env::args().collect();
    match parse_cli(&args)? {
        CliCommand::Generate(generate_args) => run_generate(generate_args, &config).await?,
        CliCommand::Styles => {
            let mapper = VisualMapper::new(&config.mapping_paths);
            for name in mapper.style_names() {
                println!("{name}");
            }
        }
        CliCommand::Help => println!("{}", usage()),
    }
    Ok(())
}
