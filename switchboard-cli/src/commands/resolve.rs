//! Show what a model identifier resolves to.

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use switchboard_models::providers::{AiService, FALLBACK_PROVIDER};
use switchboard_models::{Capabilities, ServiceFactory};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Model identifier (e.g., groq/llama3-70b)
    pub model: String,
}

pub async fn run(factory: &ServiceFactory, args: ResolveArgs) -> Result<()> {
    let service = factory.create_service(&args.model).await;
    println!("{}", describe(service.as_ref()));

    if service.provider_name() == FALLBACK_PROVIDER {
        println!();
        println!("No usable provider for '{}'; run with --verbose for details.", args.model);
    }
    Ok(())
}

fn describe(service: &dyn AiService) -> Table {
    let caps = service.capabilities();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Model").fg(Color::Cyan),
        Cell::new("Provider").fg(Color::Cyan),
        Cell::new("Max tokens").fg(Color::Cyan),
        Cell::new("Temperature").fg(Color::Cyan),
        Cell::new("Features").fg(Color::Cyan),
    ]);
    table.add_row(vec![
        Cell::new(service.model_name()),
        Cell::new(service.provider_name()),
        Cell::new(caps.max_tokens),
        Cell::new(format!("{:.1}", caps.temperature)),
        Cell::new(format_features(&caps)),
    ]);
    table
}

/// Format capability flags as a comma-separated string.
fn format_features(caps: &Capabilities) -> String {
    let mut parts = Vec::new();
    if caps.streaming {
        parts.push("streaming");
    }
    if caps.function_calling {
        parts.push("functions");
    }

    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_models::providers::FallbackService;

    #[test]
    fn format_features_lists_flags() {
        assert_eq!(format_features(&Capabilities::default()), "-");
        assert_eq!(format_features(&Capabilities::full()), "streaming, functions");
    }

    #[test]
    fn describe_shows_fallback_provider() {
        let table = describe(&FallbackService::new("nope/model")).to_string();
        assert!(table.contains("nope/model"));
        assert!(table.contains(FALLBACK_PROVIDER));
    }
}
