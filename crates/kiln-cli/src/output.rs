//! Printing planned rules.

use kiln_core::{ConfigVariant, RuleMode, ScheduledRule};

use crate::colors;

/// Print rules in execution order, one block per rule.
pub fn print_plan(rules: &[ScheduledRule]) {
    for (i, rule) in rules.iter().enumerate() {
        let mode = match rule.mode {
            RuleMode::Standard => "",
            RuleMode::Promote => " (promote)",
        };
        println!(
            "{}[{}]{} {}{}",
            colors::BOLD,
            i + 1,
            colors::RESET,
            rule.target.display(),
            mode
        );
        println!("    {}{}{}", colors::DIM, rule.action.argv.join(" "), colors::RESET);
        println!("    {}digest {:016x}{}", colors::DIM, rule.digest, colors::RESET);
    }
}

pub fn print_plan_json(rules: &[ScheduledRule]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(rules)?);
    Ok(())
}

pub fn print_summary(count: usize) {
    println!("\n{}Planned{} {} rule(s)", colors::GREEN, colors::RESET, count);
}

/// Print every variant with the flags selecting it.
pub fn print_variants() {
    for variant in ConfigVariant::all() {
        let flags = variant.to_flags();
        if flags.is_empty() {
            println!("{}{}{}", colors::CYAN, variant, colors::RESET);
        } else {
            println!("{}{}{}  {}", colors::CYAN, variant, colors::RESET, flags.join(" "));
        }
    }
}
