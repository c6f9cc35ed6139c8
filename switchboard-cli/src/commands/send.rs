//! Send a prompt to a resolved model.

use std::io::Write;
use std::sync::Mutex;

use anyhow::{Result, bail};
use clap::Args;
use switchboard_models::{Error, ServiceFactory};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Model identifier (e.g., groq/llama3-70b)
    pub model: String,

    /// Prompt text
    pub prompt: String,

    /// Print the response as it arrives
    #[arg(long)]
    pub stream: bool,
}

pub async fn run(factory: &ServiceFactory, args: SendArgs) -> Result<()> {
    let service = factory.create_service(&args.model).await;
    debug!(provider = service.provider_name(), "sending prompt");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let reply = if args.stream {
        let printer = DeltaPrinter::default();
        let reply = service
            .send_streamed_message(&args.prompt, &cancel, &|partial| printer.print(partial))
            .await;
        println!();
        reply
    } else {
        service
            .send_message(&args.prompt, &cancel)
            .await
            .inspect(|text| println!("{text}"))
    };

    match reply {
        Ok(_) => Ok(()),
        Err(Error::OperationCancelled) => bail!("cancelled"),
        Err(e) => Err(e.into()),
    }
}

/// Prints only the part of an accumulated response not yet shown.
#[derive(Default)]
struct DeltaPrinter {
    shown: Mutex<usize>,
}

impl DeltaPrinter {
    fn print(&self, partial: &str) {
        let delta = self.delta(partial);
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "{delta}");
        let _ = stdout.flush();
    }

    fn delta<'a>(&self, partial: &'a str) -> &'a str {
        let mut shown = self.shown.lock().unwrap_or_else(|e| e.into_inner());
        let start = (*shown).min(partial.len());
        *shown = partial.len();
        partial.get(start..).unwrap_or(partial)
    }
}
