use clap::Parser;
use tg_courier::config::cli::{Cli, Command};
use tg_courier::core::link::LinkTarget;
use tg_courier::domain::model::{InputFile, Message};
use tg_courier::utils::error::ErrorSeverity;
use tg_courier::utils::{logger, validation::Validate};
use tg_courier::{BotApiClient, BotConfig, CourierError, Messenger};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match BotConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config.display(), e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    let verbose = cli.verbose || config.verbose();
    if cli.json_logs || config.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let client = BotApiClient::from_config(&config);
    let messenger = Messenger::new(client, config.messaging_settings());

    if let Err(e) = run(&messenger, cli.command).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(messenger: &Messenger<BotApiClient>, command: Command) -> Result<(), CourierError> {
    match command {
        Command::Send {
            chat_id,
            reply_to,
            thread_id,
            no_block,
            text,
        } => {
            let origin = Message::reference(chat_id, reply_to).in_thread(thread_id);
            let sent = messenger
                .send_message(&origin, &text, None, !no_block)
                .await?;
            println!("✅ Sent message {} to {}", sent.id, sent.chat_id);
        }
        Command::Edit {
            chat_id,
            message_id,
            text,
        } => {
            let target = Message::reference(chat_id, message_id);
            messenger.edit_message(&target, &text, None, true).await?;
            println!("✅ Edited message {}", message_id);
        }
        Command::Delete {
            chat_id,
            message_id,
        } => {
            messenger
                .delete_message(&Message::reference(chat_id, message_id))
                .await;
            println!("🗑️ Delete requested for message {}", message_id);
        }
        Command::SendFile {
            chat_id,
            reply_to,
            caption,
            path,
        } => {
            let origin = Message::reference(chat_id, reply_to);
            let sent = messenger
                .send_file(&origin, &InputFile::Path(path), &caption)
                .await?;
            println!("✅ Sent file as message {}", sent.id);
        }
        Command::Resolve { link } => {
            let resolved = messenger.get_tg_link_message(&link).await?;
            match resolved.target {
                LinkTarget::Single(message) => {
                    println!(
                        "🔗 {} message {} in chat {} ({})",
                        resolved.session,
                        message.id,
                        message.chat_id,
                        message.text_or_empty()
                    );
                }
                LinkTarget::Range(links) => {
                    println!("🔗 {} links via {} session:", links.len(), resolved.session);
                    for link in links {
                        println!("  {}", link);
                    }
                }
            }
        }
        Command::Download { link } => {
            let resolved = messenger.get_tg_link_message(&link).await?;
            let LinkTarget::Single(message) = resolved.target else {
                return Err(CourierError::link("Download takes a single-message link"));
            };
            let path = messenger.temp_download(&message).await?;
            println!("📁 Saved to: {}", path.display());
        }
    }
    Ok(())
}
