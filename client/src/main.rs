//! Terminal chat client.
//!
//! Logs in over REST, registers on the WebSocket gateway, then drives the
//! conversation controller from two inputs: frames from the server and
//! lines from stdin. Commands: `/users`, `/open <id>`, `/quit`; anything
//! else is sent to the open conversation.

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use client::net::{api, connection, types};
use client::state::chat::{ChatController, ConnectionStatus, Direction, TranscriptEntry};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] api::ApiError),
    #[error(transparent)]
    Connection(#[from] connection::ConnectionError),
    #[error("server closed the connection")]
    ConnectionClosed,
    #[error("stdin closed")]
    StdinClosed,
}

#[derive(Parser, Debug)]
#[command(name = "agora", about = "Agora chat client")]
struct Cli {
    #[arg(long, env = "AGORA_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and chat.
    Chat {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Register { name, email, password } => register(&cli.base_url, &name, &email, &password).await,
        Command::Chat { email, password } => chat(&cli.base_url, &email, &password).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn register(base_url: &str, name: &str, email: &str, password: &str) -> Result<(), CliError> {
    let profile = api::create_account(base_url, name, email, password).await?;
    println!("account created: {} (id {})", profile.name, profile.id);
    Ok(())
}

async fn chat(base_url: &str, email: &str, password: &str) -> Result<(), CliError> {
    let profile = api::login(base_url, email, password).await?;
    println!("logged in as {} (id {})", profile.name, profile.id);

    let mut controller = ChatController::new(profile.id, profile.name.clone());

    let (mut writer, mut reader) = connection::connect(base_url).await?;
    controller.on_connected();
    connection::send_frame(&mut writer, &types::register_frame(profile.id, &profile.name)).await?;

    println!("commands: /users, /open <id>, /quit");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            frame = connection::next_frame(&mut reader) => {
                let Some(frame) = frame else {
                    controller.on_disconnected();
                    return Err(CliError::ConnectionClosed);
                };
                handle_frame(&mut controller, &frame);
            }
            line = stdin.next_line() => {
                let Ok(Some(line)) = line else {
                    return Err(CliError::StdinClosed);
                };
                if !handle_line(base_url, &mut controller, &mut writer, line.trim()).await? {
                    return Ok(());
                }
            }
        }
    }
}

/// Fold one server frame into the controller and echo it to the terminal.
fn handle_frame(controller: &mut ChatController, frame: &types::Frame) {
    if frame.is_register_ack() {
        controller.on_registered();
        println!("registered; waiting for presence");
        return;
    }

    if let Some(users) = frame.as_snapshot() {
        controller.on_snapshot(users);
        print_roster(controller);
        return;
    }

    if let Some(delivery) = frame.as_delivery() {
        let partner = delivery.recipient_id.unwrap_or(delivery.sender_id);
        controller.on_delivery(&delivery);
        if controller.active_partner() == Some(partner) {
            if let Some(entry) = controller.transcript(partner).last() {
                print_entry(entry);
            }
        } else if controller.has_unread(partner) {
            println!("* new message from user {partner} — /open {partner} to read");
        }
        return;
    }

    if let Some(recipient_id) = frame.as_recipient_offline() {
        controller.on_recipient_offline(recipient_id);
        println!("! user {recipient_id} is offline; message not delivered");
        return;
    }

    if frame.status == types::Status::Error {
        let message = frame.data.get("message").and_then(|v| v.as_str()).unwrap_or("unknown error");
        println!("! server error: {message}");
    }
}

/// Process one stdin line. Returns false when the user quits.
async fn handle_line(
    base_url: &str,
    controller: &mut ChatController,
    writer: &mut connection::WsWriter,
    line: &str,
) -> Result<bool, CliError> {
    match line {
        "" => {}
        "/quit" => return Ok(false),
        "/users" => print_roster(controller),
        _ if line.starts_with("/open ") => {
            let Ok(partner_id) = line.trim_start_matches("/open ").trim().parse::<i64>() else {
                println!("usage: /open <user id>");
                return Ok(true);
            };
            // Discard the cache and rebuild from the history store; a fetch
            // failure leaves the conversation open for live traffic.
            let history = api::fetch_history(base_url, controller.self_id(), partner_id).await;
            controller.open_conversation(partner_id, history);
            println!("--- conversation with user {partner_id} ---");
            if let Some(banner) = controller.banner() {
                println!("! {banner}");
            }
            for entry in controller.transcript(partner_id) {
                print_entry(entry);
            }
        }
        _ if line.starts_with('/') => println!("unknown command: {line}"),
        body => {
            if controller.status() != ConnectionStatus::Registered {
                println!("not registered yet");
                return Ok(true);
            }
            let Some(partner_id) = controller.active_partner() else {
                println!("no open conversation; /open <id> first");
                return Ok(true);
            };
            connection::send_frame(writer, &types::send_frame(partner_id, body)).await?;
        }
    }
    Ok(true)
}

fn print_roster(controller: &ChatController) {
    if controller.roster().is_empty() {
        println!("nobody else is online");
        return;
    }
    println!("online:");
    for user in controller.roster() {
        let marker = if controller.has_unread(user.user_id) { " *" } else { "" };
        println!("  {} (id {}){marker}", user.display_name, user.user_id);
    }
}

fn print_entry(entry: &TranscriptEntry) {
    match entry.direction {
        Direction::Sent | Direction::Received => println!("{}: {}", entry.speaker, entry.body),
        Direction::Notice => println!("! {}", entry.body),
    }
}
