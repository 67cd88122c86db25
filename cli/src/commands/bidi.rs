//! Bidi command implementation

use super::{ConnectArgs, RequestArgs};
use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use hello_shared::utils::parse_duration;

#[derive(Args, Debug)]
pub struct BidiArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    #[command(flatten)]
    pub request: RequestArgs,

    /// Pause between requests (e.g., "500ms", "1s")
    #[arg(short, long, default_value = "0ms")]
    pub interval: String,
}

pub async fn run(args: BidiArgs) -> Result<()> {
    let interval = parse_duration(&args.interval).context("Failed to parse interval")?;
    let requests = args.request.to_requests()?;
    let mut client = args.connect.connect().await?;

    let mut stream = client
        .bidi_hello(requests, interval)
        .await
        .context("BidiHello failed")?;

    while let Some(resp) = stream.message().await.context("BidiHello stream broke")? {
        output::greeting(&resp, &resp.hello, args.connect.json)?;
    }

    Ok(())
}
