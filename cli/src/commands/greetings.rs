//! Greetings command implementation

use super::{ConnectArgs, RequestArgs};
use crate::output;
use anyhow::{Context, Result};
use clap::Args;

#[derive(Args, Debug)]
pub struct GreetingsArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    #[command(flatten)]
    pub request: RequestArgs,
}

pub async fn run(args: GreetingsArgs) -> Result<()> {
    let requests = args.request.to_requests()?;
    let sent = requests.len();
    let mut client = args.connect.connect().await?;

    let collected = client
        .lots_of_greetings(requests)
        .await
        .context("LotsOfGreetings failed")?;

    if args.connect.json {
        // One object carrying every response, as the server returned it
        return output::greeting(&collected, "", true);
    }

    if collected.responses.len() != sent {
        output::warning(&format!(
            "Sent {} requests but received {} greetings",
            sent,
            collected.responses.len()
        ));
    }
    if collected.responses.is_empty() {
        output::info("No greetings");
    }
    for resp in &collected.responses {
        output::greeting(resp, &resp.hello, false)?;
    }

    Ok(())
}
