//! Log the calling party of each AGI invocation.
//!
//! Wire it up in `extensions.conf`:
//!
//! ```text
//! exten => 100,1,AGI(call_log)
//! ```

use asterisk_agi::{AgiClient, AgiResult};

fn main() -> AgiResult<()> {
    // Logs must stay off stdout, which belongs to the engine.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let agi = AgiClient::from_stdio();

    let caller = agi.callerid()?;
    let channel = agi
        .channel()?
        .unwrap_or("<unknown channel>");
    tracing::warn!(caller = %caller, channel = %channel, "incoming call");

    agi.verbose(&format!("call from {}", caller), 3)?;
    Ok(())
}
