//! Describe command implementation

use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use hello_server::proto::service_descriptors;
use hello_shared::service_map;

#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Print the service map as JSON instead of the method table
    #[arg(long, conflicts_with = "descriptors")]
    pub json: bool,

    /// Dump the service descriptors read from the compiled schema as JSON
    #[arg(long)]
    pub descriptors: bool,
}

pub fn run(args: DescribeArgs) -> Result<()> {
    let services = service_descriptors().context("Failed to read compiled schema")?;

    if args.descriptors {
        let rendered =
            serde_json::to_string_pretty(&services).context("Failed to render descriptors")?;
        println!("{}", rendered);
        return Ok(());
    }

    if args.json {
        let rendered =
            service_map::to_json_pretty(&services).context("Failed to render service map")?;
        println!("{}", rendered);
        return Ok(());
    }

    for service in &services {
        output::info(&service.full_name());
        for method in &service.methods {
            output::method(
                &method.name,
                &method.kind().to_string(),
                &service.path(&method.name),
            );
            if let Some(route) = &method.http {
                output::method("", &route.method, &route.path);
            }
        }
    }

    Ok(())
}
