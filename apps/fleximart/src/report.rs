//! Rendering command results as text tables or JSON

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use domain_products::{
    CategoryStats, NameMatch, Product, ProductSummary, RatedProduct, RecentReview, ReviewTally,
    StockLevel, TaggedProduct,
};
use eyre::{Result, WrapErr};
use serde::Serialize;

/// Writes results to stdout; logs go to stderr
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    /// Print `value` as pretty JSON, or the `text` rendering of it
    pub fn emit<T, F>(&self, value: &T, text: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> String,
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            print!("{}", text(value));
        }
        Ok(())
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(3)).collect();
        cut.push_str("...");
        cut
    }
}

fn rule(width: usize) -> String {
    format!("{}\n", "-".repeat(width))
}

fn empty_or(rows: usize, table: String) -> String {
    if rows == 0 {
        "No matching products.\n".to_string()
    } else {
        table
    }
}

pub fn summaries(rows: &[ProductSummary]) -> String {
    let mut out = format!("{:<40} {:>14} {:>8}\n", "Name", "Price", "Stock");
    out.push_str(&rule(64));
    for row in rows {
        let _ = writeln!(
            out,
            "{:<40} {:>14.2} {:>8}",
            truncate(&row.name, 40),
            row.price,
            row.stock
        );
    }
    empty_or(rows.len(), out)
}

pub fn rated(rows: &[RatedProduct]) -> String {
    let mut out = format!(
        "{:<9} {:<36} {:<12} {:>8} {:>8}\n",
        "ID", "Name", "Category", "Rating", "Reviews"
    );
    out.push_str(&rule(77));
    for row in rows {
        let _ = writeln!(
            out,
            "{:<9} {:<36} {:<12} {:>8.2} {:>8}",
            row.product_id,
            truncate(&row.name, 36),
            truncate(&row.category, 12),
            row.avg_rating,
            row.review_count
        );
    }
    empty_or(rows.len(), out)
}

pub fn category_stats(rows: &[CategoryStats]) -> String {
    let mut out = format!(
        "{:<16} {:>9} {:>14} {:>14} {:>14} {:>10}\n",
        "Category", "Products", "Avg Price", "Min Price", "Max Price", "Stock"
    );
    out.push_str(&rule(82));
    for row in rows {
        let _ = writeln!(
            out,
            "{:<16} {:>9} {:>14.2} {:>14.2} {:>14.2} {:>10}",
            truncate(&row.category, 16),
            row.product_count,
            row.avg_price,
            row.min_price,
            row.max_price,
            row.total_stock
        );
    }
    empty_or(rows.len(), out)
}

pub fn stock_levels(rows: &[StockLevel]) -> String {
    let mut out = format!("{:<9} {:<40} {:<14} {:>6}\n", "ID", "Name", "Category", "Stock");
    out.push_str(&rule(72));
    for row in rows {
        let _ = writeln!(
            out,
            "{:<9} {:<40} {:<14} {:>6}",
            row.product_id,
            truncate(&row.name, 40),
            truncate(&row.category, 14),
            row.stock
        );
    }
    empty_or(rows.len(), out)
}

pub fn tagged(rows: &[TaggedProduct]) -> String {
    let mut out = format!("{:<36} {:<14} {:>12}  {}\n", "Name", "Category", "Price", "Tags");
    out.push_str(&rule(90));
    for row in rows {
        let _ = writeln!(
            out,
            "{:<36} {:<14} {:>12.2}  {}",
            truncate(&row.name, 36),
            truncate(&row.category, 14),
            row.price,
            row.tags.join(", ")
        );
    }
    empty_or(rows.len(), out)
}

pub fn name_matches(rows: &[NameMatch]) -> String {
    let mut out = format!("{:<9} {:<40} {:>12}\n", "ID", "Name", "Price");
    out.push_str(&rule(63));
    for row in rows {
        let _ = writeln!(
            out,
            "{:<9} {:<40} {:>12.2}",
            row.product_id,
            truncate(&row.name, 40),
            row.price
        );
    }
    empty_or(rows.len(), out)
}

pub fn review_tallies(rows: &[ReviewTally]) -> String {
    let mut out = format!("{:<9} {:<40} {:>8}\n", "ID", "Name", "Reviews");
    out.push_str(&rule(59));
    for row in rows {
        let _ = writeln!(
            out,
            "{:<9} {:<40} {:>8}",
            row.product_id,
            truncate(&row.name, 40),
            row.review_count
        );
    }
    empty_or(rows.len(), out)
}

pub fn recent_reviews(rows: &[RecentReview]) -> String {
    if rows.is_empty() {
        return "No reviews.\n".to_string();
    }
    let mut out = String::new();
    for row in rows {
        let _ = writeln!(
            out,
            "{}  {} ({})  {}/5 by {}",
            row.date.format("%Y-%m-%d"),
            row.product_name,
            row.product_id,
            row.rating,
            row.username
        );
        if !row.comment.is_empty() {
            let _ = writeln!(out, "    \"{}\"", row.comment);
        }
    }
    out
}

pub fn product(product: &Product) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", product.name, product.product_id);
    let _ = writeln!(
        out,
        "  Category: {}{}",
        product.category,
        product
            .subcategory
            .as_deref()
            .map(|s| format!(" / {}", s))
            .unwrap_or_default()
    );
    let _ = writeln!(out, "  Price:    {:.2}", product.price);
    let _ = writeln!(out, "  Stock:    {}", product.stock);
    if !product.tags.is_empty() {
        let _ = writeln!(out, "  Tags:     {}", product.tags.join(", "));
    }
    for (key, value) in &product.specifications {
        let _ = writeln!(out, "  {}: {}", key, value);
    }
    match product.average_rating() {
        Some(avg) => {
            let _ = writeln!(
                out,
                "  Rating:   {:.2}/5 from {} reviews",
                avg,
                product.reviews.len()
            );
        }
        None => out.push_str("  Rating:   no reviews yet\n"),
    }
    out
}

pub fn products(rows: &[Product]) -> String {
    let mut out = format!("{:<9} {:<40} {:<14} {:>12}\n", "ID", "Name", "Category", "Price");
    out.push_str(&rule(78));
    for row in rows {
        let _ = writeln!(
            out,
            "{:<9} {:<40} {:<14} {:>12.2}",
            row.product_id,
            truncate(&row.name, 40),
            truncate(&row.category, 14),
            row.price
        );
    }
    empty_or(rows.len(), out)
}

/// Outcome of one step of the demo run
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub name: String,
    pub detail: String,
}

/// What the demo run did, for the results file
#[derive(Debug, Clone, Serialize)]
pub struct DemoSummary {
    pub generated_at: DateTime<Utc>,
    pub backend: String,
    pub database: String,
    pub collection: String,
    pub total_documents: u64,
    pub steps: Vec<StepOutcome>,
}

impl DemoSummary {
    pub fn render(&self) -> String {
        let banner = "=".repeat(70);
        let mut out = String::new();
        let _ = writeln!(out, "{}", banner);
        out.push_str("FLEXIMART - PRODUCT CATALOG OPERATIONS - RESULTS\n");
        let _ = writeln!(out, "{}\n", banner);
        let _ = writeln!(
            out,
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "Backend: {}", self.backend);
        let _ = writeln!(out, "Database: {}", self.database);
        let _ = writeln!(out, "Collection: {}", self.collection);
        let _ = writeln!(out, "Total Documents: {}\n", self.total_documents);
        out.push_str("OPERATION SUMMARY:\n");
        out.push_str(&rule(70));
        for (i, step) in self.steps.iter().enumerate() {
            let _ = writeln!(out, "{}. {}: {}", i + 1, step.name, step.detail);
        }
        out
    }
}

/// Write the demo summary as text
pub async fn write_results_file(path: &Path, summary: &DemoSummary) -> Result<()> {
    tokio::fs::write(path, summary.render())
        .await
        .wrap_err_with(|| format!("cannot write results file {}", path.display()))?;
    tracing::info!(path = %path.display(), "Results saved");
    Ok(())
}
