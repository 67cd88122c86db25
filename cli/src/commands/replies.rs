//! Replies command implementation

use super::{ConnectArgs, RequestArgs};
use crate::output;
use anyhow::{Context, Result};
use clap::Args;

#[derive(Args, Debug)]
pub struct RepliesArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    #[command(flatten)]
    pub request: RequestArgs,
}

pub async fn run(args: RepliesArgs) -> Result<()> {
    let requests = args.request.to_requests_nonempty()?;
    let mut client = args.connect.connect().await?;

    for req in requests {
        let name = req.name.clone();
        let mut stream = client
            .lots_of_replies(req)
            .await
            .with_context(|| format!("LotsOfReplies failed for {:?}", name))?;

        let mut received = 0usize;
        while let Some(resp) = stream
            .message()
            .await
            .with_context(|| format!("LotsOfReplies stream broke after {} replies", received))?
        {
            received += 1;
            output::greeting(&resp, &resp.hello, args.connect.json)?;
        }

        if received == 0 && !args.connect.json {
            output::info(&format!("No replies for {:?}", name));
        }
    }

    Ok(())
}
