use crate::models::{format_amount, BudgetBreakdown, Itinerary};

/// Plain-text rendering of an itinerary, used for both download and clipboard.
/// Days are written in stored order.
pub fn render_itinerary(destination: &str, itinerary: &Itinerary) -> String {
    let days = itinerary
        .days
        .iter()
        .map(|d| {
            format!(
                "DAY {}: {}\nMorning: {}\nAfternoon: {}\nEvening: {}\nKey Activities: {}\nTransport: {}\nCost: ${}\n",
                d.day_number,
                d.title,
                d.morning,
                d.afternoon,
                d.evening,
                d.key_activities.join(", "),
                d.transport,
                format_amount(d.estimated_cost),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let budget = match &itinerary.budget_breakdown {
        Some(breakdown) => budget_lines(breakdown),
        None => "Budget Breakdown not available.".to_string(),
    };

    format!("TRAVEL ITINERARY - {destination}\n\n{days}\n\n--- Budget Breakdown ---\n{budget}\n")
}

fn budget_lines(breakdown: &BudgetBreakdown) -> String {
    let total = breakdown.total.map(|t| format!("Total Budget: ${}", format_amount(t)));
    let buckets = breakdown.buckets.iter().map(|b| {
        format!("{}: ${} ({}%)", capitalize(&b.key), format_amount(b.amount), format_amount(b.percentage))
    });
    total.into_iter().chain(buckets).collect::<Vec<_>>().join("\n")
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `<destination with whitespace runs as underscores>_itinerary.txt`
pub fn export_filename(destination: &str) -> String {
    let mut name = String::with_capacity(destination.len() + 14);
    let mut in_space = false;
    for c in destination.chars() {
        if c.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
        } else {
            name.push(c);
            in_space = false;
        }
    }
    name.push_str("_itinerary.txt");
    name
}
