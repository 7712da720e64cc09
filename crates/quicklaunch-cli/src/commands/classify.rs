use crate::OutputFormat;
use anyhow::Result;
use quicklaunch_content::handlers::is_auto_start;
use quicklaunch_content::{resolve, PageHandler, Resolution};
use url::Url;

/// How the content script would treat a page
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Classification {
    pub url: String,
    pub referrer: String,
    pub handler: Option<String>,
    /// `executed`, `rejected` or `no-match`
    pub outcome: String,
    pub auto_start: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_referrers: Vec<String>,
}

/// Resolve a URL and referrer against the page handler registry
pub fn classify(url: &str, referrer: &str) -> Result<Classification> {
    let parsed = Url::parse(url)?;
    let resolution = resolve(&parsed, referrer);

    let (handler, outcome): (Option<PageHandler>, &str) = match resolution {
        Resolution::Matched(handler) => (Some(handler), "executed"),
        Resolution::Rejected(handler) => (Some(handler), "rejected"),
        Resolution::NoMatch => (None, "no-match"),
    };

    let allowed_referrers = handler
        .and_then(|h| h.allowed_referrers())
        .map(|list| list.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default();

    Ok(Classification {
        url: parsed.to_string(),
        referrer: referrer.to_string(),
        handler: handler.map(|h| h.name().to_string()),
        outcome: outcome.to_string(),
        auto_start: handler == Some(PageHandler::Home) && is_auto_start(&parsed),
        allowed_referrers,
    })
}

pub fn execute(url: &str, referrer: Option<&str>, format: OutputFormat) -> Result<()> {
    tracing::debug!("Classifying {} ({} output)", url, format.as_str());
    let classification = classify(url, referrer.unwrap_or(""))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&classification)?),
        OutputFormat::Table => output_table(&classification),
        OutputFormat::Pretty => output_pretty(&classification),
    }

    Ok(())
}

fn output_pretty(c: &Classification) {
    use console::style;

    println!("\n{}", style("Page Classification").bold().cyan());
    println!("  URL:       {}", c.url);
    if !c.referrer.is_empty() {
        println!("  Referrer:  {}", c.referrer);
    }

    let outcome = match c.outcome.as_str() {
        "executed" => style(c.outcome.as_str()).green(),
        "rejected" => style(c.outcome.as_str()).red(),
        _ => style(c.outcome.as_str()).dim(),
    };
    println!(
        "  Handler:   {}",
        style(c.handler.as_deref().unwrap_or("none")).yellow()
    );
    println!("  Outcome:   {}", outcome);

    if c.auto_start {
        println!("  Auto start requested via URL fragment");
    }

    if !c.allowed_referrers.is_empty() {
        println!("\n{}", style("Allowed referrers").bold());
        for referrer in &c.allowed_referrers {
            println!("  {}", referrer);
        }
    }

    println!();
}

fn output_table(c: &Classification) {
    println!("Field,Value");
    println!("URL,{}", c.url);
    println!("Referrer,{}", c.referrer);
    println!("Handler,{}", c.handler.as_deref().unwrap_or(""));
    println!("Outcome,{}", c.outcome);
    println!("Auto Start,{}", c.auto_start);
}
