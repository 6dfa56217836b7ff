use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "tg-courier")]
#[command(about = "Send, edit, delete and resolve Telegram messages from the command line")]
pub struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "tg-courier.toml")]
    pub config: PathBuf,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Reply to a message with text
    Send {
        #[arg(long, allow_hyphen_values = true)]
        chat_id: i64,
        #[arg(long)]
        reply_to: i64,
        #[arg(long)]
        thread_id: Option<i64>,
        /// Do not wait out rate limits
        #[arg(long)]
        no_block: bool,
        text: String,
    },
    /// Replace the text of a message
    Edit {
        #[arg(long, allow_hyphen_values = true)]
        chat_id: i64,
        #[arg(long)]
        message_id: i64,
        text: String,
    },
    Delete {
        #[arg(long, allow_hyphen_values = true)]
        chat_id: i64,
        #[arg(long)]
        message_id: i64,
    },
    /// Reply to a message with a local file
    SendFile {
        #[arg(long, allow_hyphen_values = true)]
        chat_id: i64,
        #[arg(long)]
        reply_to: i64,
        #[arg(long, default_value = "")]
        caption: String,
        path: PathBuf,
    },
    /// Resolve a t.me or tg:// message link
    Resolve { link: String },
    /// Download the file attached to the message a link points at
    Download { link: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send_with_negative_chat_id() {
        let cli = Cli::parse_from([
            "tg-courier",
            "send",
            "--chat-id",
            "-100123",
            "--reply-to",
            "5",
            "hello there",
        ]);

        assert_eq!(cli.config, PathBuf::from("tg-courier.toml"));
        match cli.command {
            Command::Send {
                chat_id,
                reply_to,
                thread_id,
                no_block,
                text,
            } => {
                assert_eq!(chat_id, -100123);
                assert_eq!(reply_to, 5);
                assert_eq!(thread_id, None);
                assert!(!no_block);
                assert_eq!(text, "hello there");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_resolve_with_config() {
        let cli = Cli::parse_from([
            "tg-courier",
            "--config",
            "/etc/bot.toml",
            "--json-logs",
            "resolve",
            "https://t.me/c/1/2",
        ]);

        assert_eq!(cli.config, PathBuf::from("/etc/bot.toml"));
        assert!(cli.json_logs);
        assert!(
            matches!(cli.command, Command::Resolve { ref link } if link == "https://t.me/c/1/2")
        );
    }
}
