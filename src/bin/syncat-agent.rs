//! Remote half of syncat
//!
//! Invoked over SSH once per request. Prints exactly one reply on stdout
//! and exits non-zero with the error on stderr when the request fails.

use clap::Parser;
use syncat::logging::init_agent_logging;
use syncat::remote::agent::handle;
use syncat::remote::AgentCli;

fn main() -> anyhow::Result<()> {
    let cli = AgentCli::parse();
    init_agent_logging();

    let reply = handle(&cli.command)?;
    println!("{}", reply);
    Ok(())
}
