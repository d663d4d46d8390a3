// Terminal display for bias summaries.
//
// Two registers: a plain key/value listing for piping, and a colored
// human-oriented layout behind the `user_friendly` flag.

use colored::Colorize;

use super::summary::BiasSummary;

/// Print the session summary to stdout.
pub fn display_summary(summary: &BiasSummary, user_friendly: bool) {
    if !user_friendly {
        display_plain(summary);
        return;
    }

    println!(
        "\n{}",
        format!("=== Bias summary for {} ===", summary.model_name).bold()
    );
    println!(
        "  {} neutral tokens, {} dimensions{}",
        summary.neutral_tokens,
        summary.dimension,
        match summary.pca_dimension {
            Some(d) => format!(" (PCA-reduced to {d})"),
            None => String::new(),
        }
    );

    println!("\n  {}", "Groups".bold());
    for group in &summary.groups {
        println!(
            "    {:<12} {} tokens  {}",
            group.name,
            group.tokens_matched,
            group.seed_words.join(", ").dimmed()
        );
    }
    if !summary.excluded_words.is_empty() {
        println!(
            "    excluded: {}",
            summary.excluded_words.join(", ").dimmed()
        );
    }

    if summary.metrics.is_empty() {
        println!("\n  No metrics computed this session.");
    } else {
        println!("\n  {}", "Metrics".bold());
        for (name, value) in &summary.metrics {
            println!("    {:<24} {:>12.6}", name, value);
        }
    }

    // Entropy bars, scaled to the largest group contribution. An even bar
    // chart means no group dominates the neutral tokens' alignments.
    let max_entropy = summary
        .entropy_per_group
        .values()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    if max_entropy > 0.0 {
        println!("\n  {}", "Entropy per group".bold());
        let bar_width: usize = 20;
        for (name, value) in &summary.entropy_per_group {
            let filled = ((value / max_entropy) * bar_width as f64).round() as usize;
            let bar = format!(
                "[{}{}]",
                "=".repeat(filled.min(bar_width)),
                " ".repeat(bar_width.saturating_sub(filled))
            );
            let z = summary.entropy_z_scores.get(name).copied().unwrap_or(0.0);
            println!(
                "    {:<12} {} {:.4}  {}",
                name,
                bar.bright_blue(),
                value,
                format!("z={z:+.2}").dimmed()
            );
        }
    }
    println!();
}

fn display_plain(summary: &BiasSummary) {
    println!("model: {}", summary.model_name);
    println!("neutral_tokens: {}", summary.neutral_tokens);
    println!("dimension: {}", summary.dimension);
    for group in &summary.groups {
        println!("group {}: {} tokens", group.name, group.tokens_matched);
    }
    for (name, value) in &summary.metrics {
        println!("{name}: {value}");
    }
    for (name, value) in &summary.entropy_per_group {
        println!("entropy {name}: {value}");
    }
}
