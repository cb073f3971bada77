use clap::{Parser, Subcommand};
use colored::*;
use pygpt::api::Server;
use pygpt::builder::LLMBackend;
use pygpt::chain::{CodeGenChain, GenerationResult, Stage};
use pygpt::config::AppConfig;
use pygpt::error::LLMError;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use spinners::{Spinner, Spinners};
use std::process::ExitCode;
use std::str::FromStr;

/// Command line arguments for PYGPT
#[derive(Parser)]
#[command(
    name = "pygpt",
    about = "Generate Python code for a topic, describe it, and give an example"
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,

    /// LLM backend (groq or openai)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// API key for the backend (defaults to GROQ_API_KEY / OPENAI_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Model name to use
    #[arg(long, global = true)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Maximum tokens per answer
    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the generator page
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run the pipeline once and print the results
    Generate {
        /// Topic to generate code for
        #[arg(required = true, num_args = 1..)]
        topic: Vec<String>,
    },
    /// Generate interactively, keeping the transcripts of the session
    Repl,
}

/// Environment configuration with command line overrides applied.
fn load_config(args: &CliArgs) -> Result<AppConfig, LLMError> {
    let mut config = AppConfig::from_env()?;
    if let Some(backend) = &args.backend {
        config.switch_backend(LLMBackend::from_str(backend)?, |key| std::env::var(key).ok());
    }
    if let Some(key) = &args.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(model) = &args.model {
        config.model = Some(model.clone());
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(url) = &args.base_url {
        config.base_url = Some(url.clone());
    }
    if args.max_tokens.is_some() {
        config.max_tokens = args.max_tokens;
    }
    if args.timeout.is_some() {
        config.timeout_seconds = args.timeout;
    }
    if let Command::Serve { bind: Some(bind) } = &args.command {
        config.bind = bind.clone();
    }
    Ok(config)
}

fn print_result(result: &GenerationResult) {
    for (stage, title) in [
        (Stage::Code, "🛠️  Generated Python Code"),
        (Stage::Description, "📜 Code Description"),
        (Stage::Example, "💡 Example Usage"),
    ] {
        println!("{}", title.bright_cyan().bold());
        println!("{}\n", result.get(stage));
    }
}

fn print_history(chain: &CodeGenChain) {
    for (stage, title) in [
        (Stage::Code, "Code Generation History"),
        (Stage::Description, "Description History"),
        (Stage::Example, "Example History"),
    ] {
        println!("{}", format!("🔍 {title}").bright_yellow());
        let buffer = chain.buffer(stage);
        if buffer.is_empty() {
            println!("{}", "(empty)".bright_black());
        } else {
            println!("{buffer}");
        }
        println!("{}", "─".repeat(50).bright_black());
    }
}

/// Runs the chain behind a terminal spinner.
async fn generate_with_spinner(
    chain: &mut CodeGenChain,
    topic: &str,
) -> Result<GenerationResult, LLMError> {
    let mut sp = Spinner::new(
        Spinners::Dots12,
        "Generating results...".bright_magenta().to_string(),
    );
    let result = chain.generate(topic).await;
    sp.stop();
    print!("\r\x1B[K");
    if result.is_ok() {
        println!("{}", "🎉 Results Generated!".bright_green());
    }
    result
}

async fn repl(mut chain: CodeGenChain) -> Result<(), LLMError> {
    println!("{}", "PYGPT - Python Code Generator".bright_cyan());
    println!(
        "{}",
        "Enter a topic; ':history' shows the transcripts, 'exit' quits".bright_black()
    );
    println!("{}", "─".repeat(50).bright_black());

    let mut rl = DefaultEditor::new().map_err(|e| LLMError::Generic(e.to_string()))?;

    loop {
        match rl.readline("🎯 topic> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
                    println!("{}", "👋 Goodbye!".bright_cyan());
                    break;
                }
                let _ = rl.add_history_entry(trimmed);

                if trimmed == ":history" {
                    print_history(&chain);
                    continue;
                }

                match generate_with_spinner(&mut chain, trimmed).await {
                    Ok(result) => print_result(&result),
                    Err(e) => eprintln!("{} {}", "Error:".bright_red(), e),
                }
                println!("{}", "─".repeat(50).bright_black());
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\n{}", "👋 Goodbye!".bright_cyan());
                break;
            }
            Err(err) => {
                eprintln!("{} {:?}", "Error:".bright_red(), err);
                break;
            }
        }
    }

    Ok(())
}

async fn run(args: CliArgs) -> Result<(), LLMError> {
    let config = load_config(&args)?;
    let llm = config.build_provider()?;

    match args.command {
        Command::Serve { .. } => Server::new(llm)?.run(&config.bind).await,
        Command::Generate { topic } => {
            let mut chain = CodeGenChain::new(llm)?;
            let result = generate_with_spinner(&mut chain, &topic.join(" ")).await?;
            print_result(&result);
            Ok(())
        }
        Command::Repl => repl(CodeGenChain::new(llm)?).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    pygpt::init_logging();
    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".bright_red(), e);
            ExitCode::FAILURE
        }
    }
}
