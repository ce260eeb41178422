use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "gossip-chain")]
pub struct Opt {
    #[arg(long = "config", global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        name = "wallet",
        about = "Open the interactive ledger menu with a fresh wallet"
    )]
    Wallet {
        #[arg(long = "difficulty", help = "Leading hex zeros required on mined blocks")]
        difficulty: Option<usize>,
    },
    #[command(name = "node", about = "Start a chat node and join the swarm")]
    Node {
        #[arg(long = "port", help = "Port to listen on (defaults to PORT or 2001)")]
        port: Option<u16>,
        #[arg(help = "Peers to dial on startup, as host:port")]
        peers: Vec<String>,
    },
}
