//! Plain-text rendering of a literature review

use std::fmt::{self, Write};

use litrev_core::{Article, ReviewResponse, Synthesis};

/// Render a review for the terminal
pub fn review(query: &str, review: &ReviewResponse) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_review(&mut out, query, review);
    out
}

fn write_review(out: &mut impl Write, query: &str, review: &ReviewResponse) -> fmt::Result {
    writeln!(out, "Literature landscape: {}", query)?;
    writeln!(out, "{}", "=".repeat(22 + query.chars().count()))?;
    writeln!(out)?;

    if review.articles.is_empty() {
        writeln!(out, "No articles found")?;
    } else {
        writeln!(out, "{} articles", review.articles.len())?;
        for (i, article) in review.articles.iter().enumerate() {
            writeln!(out)?;
            write_article(out, i + 1, article)?;
        }
    }

    writeln!(out)?;
    write_synthesis(out, &review.synthesis)
}

fn write_article(out: &mut impl Write, index: usize, article: &Article) -> fmt::Result {
    writeln!(out, "[{}] {} ({})", index, article.title, article.confidence)?;
    writeln!(out, "    {}", byline(article))?;

    section(out, "Abstract", &article.abstract_text)?;
    section(out, "Research Goal", &article.research_goal)?;
    section(out, "Methodology", &article.methodology)?;
    section(out, "Main Results", &article.main_results)?;
    section(out, "Key Contributions", &article.key_contributions)?;
    section(out, "Limitations & Open Questions", &article.limitations)?;

    if !article.keywords.is_empty() {
        writeln!(out, "    Keywords: {}", article.keywords.join(", "))?;
    }
    if !article.source.is_empty() {
        writeln!(out, "    Source: {}", article.source)?;
    }
    if let Some(doi) = article.doi.as_deref().filter(|d| !d.is_empty()) {
        writeln!(out, "    DOI: https://doi.org/{}", doi)?;
    }
    Ok(())
}

fn write_synthesis(out: &mut impl Write, synthesis: &Synthesis) -> fmt::Result {
    writeln!(out, "Synthesis")?;
    writeln!(out, "---------")?;
    section(out, "Field Overview", &synthesis.field_overview)?;
    section(out, "Gaps & Challenges", &synthesis.gaps_and_challenges)?;
    section(out, "Future Directions", &synthesis.future_directions)
}

/// Authors, year and venue joined by bullets, skipping empty parts
fn byline(article: &Article) -> String {
    let mut parts = Vec::new();
    if !article.authors.is_empty() {
        parts.push(article.authors.join(", "));
    }
    if article.publication_year > 0 {
        parts.push(article.publication_year.to_string());
    }
    if !article.venue.is_empty() {
        parts.push(article.venue.clone());
    }
    parts.join(" • ")
}

fn section(out: &mut impl Write, heading: &str, body: &str) -> fmt::Result {
    let body = body.trim();
    if body.is_empty() {
        return Ok(());
    }
    writeln!(out, "    {}:", heading)?;
    for line in body.lines() {
        writeln!(out, "      {}", line)?;
    }
    Ok(())
}
