//! List providers the factory can serve.

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use switchboard_models::ServiceFactory;

#[derive(Args, Debug)]
pub struct ProvidersArgs {
    /// Only providers that can be built right now
    #[arg(long)]
    pub active: bool,
}

pub async fn run(factory: &ServiceFactory, args: ProvidersArgs) -> Result<()> {
    let active = factory.active_providers().await;
    let providers: Vec<_> = if args.active {
        active.iter().cloned().collect()
    } else {
        factory.supported_providers().into_iter().collect()
    };

    if providers.is_empty() {
        println!("No providers available.");
        println!();
        println!("Store a credential with: switchboard credentials set <provider>");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Provider").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
    ]);

    for provider in providers {
        let status = if active.contains(&provider) {
            Cell::new("ready").fg(Color::Green)
        } else {
            Cell::new("no credential").fg(Color::Yellow)
        };
        table.add_row(vec![Cell::new(provider), status]);
    }

    println!("{table}");
    Ok(())
}
