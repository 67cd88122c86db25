//! Say command implementation

use super::{ConnectArgs, RequestArgs};
use crate::output;
use anyhow::{Context, Result};
use clap::Args;

#[derive(Args, Debug)]
pub struct SayArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    #[command(flatten)]
    pub request: RequestArgs,
}

pub async fn run(args: SayArgs) -> Result<()> {
    let requests = args.request.to_requests_nonempty()?;
    let mut client = args.connect.connect().await?;

    for req in requests {
        let name = req.name.clone();
        let resp = client
            .say_hello(req)
            .await
            .with_context(|| format!("SayHello failed for {:?}", name))?;
        output::greeting(&resp, &resp.hello, args.connect.json)?;
    }

    Ok(())
}
