// This is my main entry point for the gossip-chain CLI
use clap::Parser;
use gossip_chain::{
    Blockchain, ChatMessage, Command, GossipNode, LedgerMenu, Opt, Settings, Wallet,
};
use log::{error, info, LevelFilter};
use std::io::{self, BufRead};
use std::process;
use std::sync::mpsc::Receiver;
use std::thread;

fn main() {
    // Info level shows connections and mining without flooding the terminal.
    // RUST_LOG still wins when it is set.
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

// I load settings first so every command sees the same layered config,
// then let command-line flags win over both the file and the environment
fn run_command(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Settings::load(opt.config.as_deref())?;

    match opt.command {
        Command::Wallet { difficulty } => {
            if let Some(difficulty) = difficulty {
                settings.ledger.difficulty = difficulty;
                settings.ledger.validate()?;
            }

            let blockchain = Blockchain::with_settings(&settings.ledger)?;
            let wallet = Wallet::new();
            let stdin = io::stdin();
            let mut menu = LedgerMenu::new(blockchain, wallet, stdin.lock(), io::stdout());
            menu.run()?;
        }
        Command::Node { port, peers } => {
            if let Some(port) = port {
                settings.node.port = port;
            }
            settings.node.peers.extend(peers);

            let (node, messages) = GossipNode::start(&settings.node)?;
            info!("Listening on port {}", node.transport().listen_port());

            thread::spawn(move || print_messages(messages));

            // Every line typed on stdin goes out to the swarm
            for line in io::stdin().lock().lines() {
                let line = line?;
                let sent = node.broadcast_chat(&line)?;
                if sent > 0 {
                    info!("Sent to {sent} peer(s)");
                }
            }
        }
    }
    Ok(())
}

fn print_messages(messages: Receiver<ChatMessage>) {
    for chat in messages {
        println!("[Message from {}:{}]: {}", chat.peer.ip(), chat.port, chat.text);
    }
}
