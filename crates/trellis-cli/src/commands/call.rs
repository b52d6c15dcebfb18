//! Raw request passthrough

use std::io::Read;

use clap::Args;

use crate::AppContext;

#[derive(Args)]
pub struct CallArgs {
    /// Request JSON, e.g. '{"action":"getGraphStats"}'. Reads stdin when omitted or "-".
    pub request: Option<String>,
}

pub async fn run(args: &CallArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let raw = match args.request.as_deref() {
        Some(text) if text != "-" => text.to_string(),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let response = ctx.service.dispatch_json(&raw).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    match response.error {
        Some(error) if !response.ok => anyhow::bail!("{}: {}", error.kind, error.message),
        _ => Ok(()),
    }
}
