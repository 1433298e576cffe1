#![deny(unused)]
//! Quest Packet - demo host
//!
//! Loads the packet configuration, wires a terminal-backed host to the quest
//! agent and drives it with line commands from stdin:
//!
//! ```text
//! visit <locator>   deliver a visit event
//! run <code>        evaluate a payload (`\n` for line breaks)
//! status            print task status as JSON
//! quit              exit
//! ```

mod commands;
mod console_host;
mod tracing_layer;

use std::io::BufRead;
use std::sync::Arc;

use quest_packet_agent::QuestAgent;
use quest_packet_core::config::PacketConfig;

use crate::commands::{expand_newlines, Command};
use crate::console_host::ConsoleHost;

fn main() -> anyhow::Result<()> {
    let config = PacketConfig::load()?;
    tracing_layer::configure_tracing(&config.logging)?;

    tracing::info!(
        packet = %config.packet.name,
        "Starting questpacket v{}",
        env!("CARGO_PKG_VERSION")
    );

    let host = Arc::new(ConsoleHost::stdout());
    let agent = QuestAgent::builder()
        .with_config(config)
        .with_host(host.clone())
        .build()?;
    agent.initialize();

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match Command::parse(&line) {
            Command::Visit(locator) => {
                let fired = agent.on_visit(locator);
                host.print(&format!("{} task(s) completed", fired.len()))?;
            }
            Command::Run(code) => {
                host.print(&agent.run(&expand_newlines(code)))?;
            }
            Command::Status => {
                host.print(&serde_json::to_string(&agent.snapshot())?)?;
            }
            Command::Quit => break,
            Command::Empty => {}
            Command::Unknown(input) => {
                host.print(&format!("unknown command: {}", input))?;
            }
        }
    }

    tracing::info!("Shutting down");
    Ok(())
}
