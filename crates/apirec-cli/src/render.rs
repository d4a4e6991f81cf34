//! Terminal rendering utilities.

use apirec_core::RecommendationRecord;
use apirec_recommender::IngestReport;
use console::style;

/// Render markdown text to the terminal.
pub fn render_markdown(text: &str) {
    let skin = termimad::MadSkin::default();
    skin.print_text(text);
}

/// Plain-text recommendation list, one entry per record.
pub fn format_recommendations(records: &[RecommendationRecord]) -> String {
    let mut out = String::new();
    for (i, record) in records.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} ({:.2})\n   {}\n",
            i + 1,
            record.api_name,
            record.score,
            record.description
        ));
        if let Some(endpoint) = record.display_endpoint() {
            out.push_str(&format!("   {}\n", endpoint));
        }
    }
    out
}

/// Print the recommendation list, or a no-matches note.
pub fn render_recommendations(records: &[RecommendationRecord]) {
    if records.is_empty() {
        println!("{}", style("No matching APIs found.").yellow());
        return;
    }
    if !console::Term::stdout().is_term() {
        print!("{}", format_recommendations(records));
        return;
    }

    println!("{}", style("Recommended APIs").bold().cyan());
    for (i, record) in records.iter().enumerate() {
        println!(
            "{} {} {}",
            style(format!("{}.", i + 1)).dim(),
            style(&record.api_name).bold(),
            style(format!("({:.2})", record.score)).dim()
        );
        println!("   {}", record.description);
        if let Some(endpoint) = record.display_endpoint() {
            println!("   {}", style(endpoint).green());
        }
    }
    println!();
}

/// Print an ingestion summary.
pub fn render_ingest_report(report: &IngestReport) {
    let status = if report.is_complete() {
        style("Ingestion complete").green().bold()
    } else {
        style("Ingestion finished with gaps").yellow().bold()
    };
    println!("{}", status);
    println!("  rows read:  {}", report.rows_read);
    println!("  upserted:   {}", report.upserted);
    println!("  batches:    {}", report.batches);
    if report.index_created {
        println!("  {}", style("index created").dim());
    }

    for skipped in &report.skipped {
        println!(
            "  {} {} {}",
            style("skipped").yellow(),
            skipped.id,
            style(&skipped.reason).dim()
        );
    }
    for failed in &report.failed_batches {
        println!(
            "  {} batch {} ({} records) {}",
            style("failed").red(),
            failed.batch,
            failed.ids.len(),
            style(&failed.reason).dim()
        );
    }
}

/// Print the welcome banner for the interactive loop.
pub fn render_welcome(index: &str) {
    eprintln!(
        "{} {} {}",
        style("apirec").bold().cyan(),
        style("interactive").dim(),
        style(format!("({})", index)).dim(),
    );
    eprintln!("{}", style("Describe what you need. Type quit to exit.").dim());
    eprintln!();
}
