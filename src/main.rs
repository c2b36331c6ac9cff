use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use community_chat::attachment::FileInput;
use community_chat::config::{Cli, Config};
use community_chat::identity::initials;
use community_chat::model::{format_time, ChatMessage};
use community_chat::transport::WsTransport;
use community_chat::ChatError;
use community_chat::Session;

// Single-threaded cooperative scheduling: every state mutation happens on
// an event callback or timer on this one thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load(&cli)?;
    let level = if cfg.logging_enabled {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(level).init();
    run(cli, cfg).await
}

async fn run(cli: Cli, cfg: Config) -> Result<()> {
    let (transport, mut inbound) = WsTransport::connect(&cfg.server_url).await?;
    let mut session = Session::new(transport, &cfg);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    match cli.username {
        Some(name) => session.join(&name)?,
        None => loop {
            println!("username:");
            let Some(line) = lines.next_line().await? else {
                return Ok(());
            };
            match session.join(&line) {
                Ok(()) => break,
                Err(ChatError::InvalidUsername) => continue,
                Err(e) => return Err(e.into()),
            }
        },
    }
    println!(
        "joined as {} (/attach <path>, /reply <n>, /cancel, /who, /quit)",
        session.username()
    );

    loop {
        tokio::select! {
            event = inbound.recv() => {
                let Some(event) = event else {
                    println!("connection closed");
                    break;
                };
                let before = session.messages().len();
                session.apply(event);
                if session.messages().len() > before {
                    if let Some(msg) = session.messages().last() {
                        println!("{}", render_line(before, msg));
                    }
                }
                let typists = session.typists();
                if !typists.is_empty() {
                    println!("({} typing...)", typists.join(", "));
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Err(e) = handle_line(&mut session, &line).await {
                    match e {
                        ChatError::EmptyMessage => {}
                        other => println!("error: {other}"),
                    }
                }
                if line.trim() == "/quit" {
                    break;
                }
            }
        }
    }

    session.shutdown();
    Ok(())
}

async fn handle_line(session: &mut Session, line: &str) -> Result<(), ChatError> {
    let trimmed = line.trim();
    if let Some(path) = trimmed.strip_prefix("/attach ") {
        let file = FileInput::read(&PathBuf::from(path.trim())).await?;
        session.attach(file).await?;
        println!("staged {}", path.trim());
        return Ok(());
    }
    if let Some(index) = trimmed.strip_prefix("/reply ") {
        let index: usize = index
            .trim()
            .parse()
            .map_err(|_| ChatError::NoSuchMessage(0))?;
        session.set_reply(index)?;
        return Ok(());
    }
    match trimmed {
        "/cancel" => {
            session.cancel_reply();
            session.clear_attachment();
            Ok(())
        }
        "/who" => {
            for user in session.roster() {
                println!("  [{}] {}", initials(&user.username), user.username);
            }
            Ok(())
        }
        "/quit" => Ok(()),
        _ => {
            session.input_changed();
            session.send(line).await
        }
    }
}

fn render_line(index: usize, msg: &ChatMessage) -> String {
    let mut out = String::new();
    if let Some(reply) = &msg.reply_to {
        out.push_str(&format!("  > {}: {}\n", reply.username, reply.message));
    }
    out.push_str(&format!(
        "#{index} [{}] {} {}: {}",
        initials(&msg.username),
        format_time(msg.received_at_ms),
        msg.username,
        msg.body
    ));
    if let Some(file) = &msg.attachment {
        out.push_str(&format!("  ({}, {} bytes)", file.name, file.size));
    }
    out
}
