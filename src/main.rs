use clap::{Parser, Subcommand};
use colored::*;
use anyhow::Result;

mod app;
mod backend;
mod chat;
mod config;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use backend::AnalysisClient;
use config::Config;

#[derive(Parser)]
#[command(name = "timesheets")]
#[command(about = "Ask questions about timesheet data and chat with the analysis service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the JSON result
    Ask {
        /// Your question
        question: String,
        /// Analysis endpoint URL (overrides the configured one)
        #[arg(short, long)]
        endpoint: Option<String>,
    },
    /// Show or update the configured backend endpoints
    Endpoint {
        /// Set the analysis endpoint URL
        #[arg(long)]
        analyze: Option<String>,
        /// Set the chat endpoint URL
        #[arg(long)]
        chat: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;

    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|_| Config::new());

    match cli.command {
        None => run_tui(config).await?,
        Some(Commands::Ask { question, endpoint }) => {
            ask_once(&config, &question, endpoint.as_deref()).await?
        }
        Some(Commands::Endpoint { analyze, chat }) => configure_endpoints(config, analyze, chat)?,
    }

    Ok(())
}

async fn run_tui(config: Config) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new(&config);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(&mut app, event)?;
        }

        // Reap finished requests; the tick event keeps this moving even
        // while the user is idle
        app.poll_tasks().await;
    }

    tui::restore()?;
    Ok(())
}

async fn ask_once(config: &Config, question: &str, endpoint: Option<&str>) -> Result<()> {
    let analyze_url = endpoint.unwrap_or_else(|| config.analyze_url());
    let client = AnalysisClient::new(analyze_url, config.chat_url());

    println!("{} {}", "Asking:".bold().cyan(), question);

    match client.analyze(question).await {
        Ok(reply) => {
            println!("\n{}", "Result:".bold().green());
            println!("{}", reply.to_pretty_json());
        }
        Err(e) => {
            println!("{}: {}", "Error querying the analysis backend".red(), e);
            println!("Make sure the backend is running at {}", analyze_url.bold());
        }
    }

    Ok(())
}

fn configure_endpoints(
    mut config: Config,
    analyze: Option<String>,
    chat: Option<String>,
) -> Result<()> {
    if analyze.is_none() && chat.is_none() {
        println!("{}", "Configured endpoints".bold().blue());
        println!("  analyze: {}", config.analyze_url());
        println!("  chat:    {}", config.chat_url());
        return Ok(());
    }

    if let Some(url) = analyze {
        config.analyze_url = Some(url);
    }
    if let Some(url) = chat {
        config.chat_url = Some(url);
    }
    config.save()?;

    println!("{}", "Endpoints saved.".green());
    Ok(())
}
