mod chat;
mod cli_args;
mod config;
mod llm;
mod logging;
mod setup;

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use chat::{send_message, Conversation};
use cli_args::{Cli, Command};
use config::Config;
use llm::prompt_builder::chat_request;
use llm::stream::Snapshot;
use llm::{ApiError, ChatReply, LlmClient};

/// Ask one question, streaming or waiting behind a spinner.
fn exchange(
    cfg: &Config,
    llm: &dyn LlmClient,
    convo: &Conversation,
    message: &str,
) -> Result<ChatReply, ApiError> {
    let request = chat_request(message, convo.history(), &cfg.model, cfg.sampling);

    if cfg.stream {
        let mut stdout = io::stdout();
        let mut print_fragment = |snapshot: &Snapshot| {
            // the cumulative text only ever grows, so printing the new piece
            // leaves the terminal showing the full snapshot
            print!("{}", snapshot.fragment);
            if let Err(e) = stdout.flush() {
                log::debug!("Failed to flush stdout: {e}");
            }
        };
        let reply = send_message(llm, &request, Some(&mut print_fragment));
        println!();
        return reply;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Waiting for {}...", cfg.model));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let reply = send_message(llm, &request, None);
    spinner.finish_and_clear();

    if let Ok(reply) = &reply {
        println!("{}", reply.text);
    }
    reply
}

fn report(reply: &ChatReply) {
    log::debug!(
        "Model used: {} ({:.2}s)",
        reply.model.as_deref().unwrap_or("Not specified"),
        reply.processing_time.as_secs_f64()
    );
}

/// One-shot mode: send a single message and print the reply.
fn run_ask(cfg: &Config, llm: &dyn LlmClient, message: &str) -> Result<()> {
    let reply = exchange(cfg, llm, &Conversation::new(), message)?;
    report(&reply);
    Ok(())
}

/// Ask the user for a line; `None` on end of input.
fn prompt_input(stdin: &mut impl BufRead) -> Result<Option<String>> {
    print!("you> ");
    io::stdout().flush()?;

    let mut buf = String::new();
    let read = stdin.read_line(&mut buf).context("failed to read from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim().to_string()))
}

/// Interactive mode: keep a conversation going until /quit or end of input.
fn run_chat(cfg: &Config, llm: &dyn LlmClient) -> Result<()> {
    println!("Owlet ({}) - type /reset to start over, /quit to leave.", cfg.model);

    let mut convo = Conversation::new();
    let mut stdin = io::stdin().lock();

    while let Some(line) = prompt_input(&mut stdin)? {
        match line.as_str() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                convo.clear();
                println!("(history cleared)");
                continue;
            }
            _ => {}
        }

        print!("owlet> ");
        io::stdout().flush()?;

        match exchange(cfg, llm, &convo, &line) {
            Ok(reply) => {
                report(&reply);
                convo.push_exchange(&line, &reply.text);
            }
            Err(err) => {
                if let Some(partial) = err.partial_text() {
                    log::warn!("Reply cut short after {} bytes", partial.len());
                }
                eprintln!("error: {err}");
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    let cfg = Config::from_sources(&cli);
    let client = setup::build_llm_client(&cfg)?;

    match &cli.command {
        Some(Command::Ask { message }) => run_ask(&cfg, client.as_ref(), &message.join(" ")),
        Some(Command::Chat) | None => run_chat(&cfg, client.as_ref()),
    }
}
