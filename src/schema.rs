use serde_json::{Map, Value};
use tracing::debug;

use crate::error::SchemaError;
use crate::models::{
    BudgetBreakdown, BudgetBucket, DayPlan, DiningOption, EmergencyContacts, Itinerary, Logistics, Meals,
    Recommendations, Stay,
};

/// Parses and normalizes an itinerary payload.
///
/// A non-empty `days` array whose entries carry a `dayNumber` is the only
/// hard requirement. Everything else is read leniently: missing or mistyped
/// fields become empty strings, empty lists or `None`, so nothing downstream
/// has to probe raw JSON.
pub fn validate_itinerary(candidate: &str) -> Result<Itinerary, SchemaError> {
    let root: Value = serde_json::from_str(candidate).map_err(|e| SchemaError::Malformed(e.to_string()))?;

    let days = match root.get("days") {
        Some(Value::Array(days)) if !days.is_empty() => days,
        _ => return Err(SchemaError::MissingDays),
    };
    let days = days
        .iter()
        .enumerate()
        .map(|(index, day)| parse_day(day, index).ok_or(SchemaError::InvalidDay { index }))
        .collect::<Result<Vec<_>, _>>()?;

    let itinerary = Itinerary {
        days,
        budget_breakdown: root.get("budgetBreakdown").and_then(Value::as_object).map(parse_budget),
        recommendations: root.get("recommendations").filter(|v| v.is_object()).map(parse_recommendations),
        logistics: root.get("logistics").filter(|v| v.is_object()).map(parse_logistics),
    };
    debug!(
        days = itinerary.days.len(),
        has_budget = itinerary.budget_breakdown.is_some(),
        "validate_itinerary: accepted"
    );
    Ok(itinerary)
}

fn parse_day(day: &Value, index: usize) -> Option<DayPlan> {
    let day_number = day.get("dayNumber").filter(|v| !v.is_null()).map(|v| day_number(v, index))?;
    let meals = day.get("meals").unwrap_or(&Value::Null);
    Some(DayPlan {
        day_number,
        title: text(day, "title"),
        morning: text(day, "morning"),
        afternoon: text(day, "afternoon"),
        evening: text(day, "evening"),
        key_activities: strings(day, "keyActivities"),
        estimated_cost: number(day, "estimatedCost").filter(|c| *c >= 0.0).unwrap_or(0.0),
        transport: text(day, "transport"),
        accommodation: text(day, "accommodation"),
        meals: Meals {
            breakfast: text(meals, "breakfast"),
            lunch: text(meals, "lunch"),
            dinner: text(meals, "dinner"),
        },
    })
}

/// Only presence of `dayNumber` is required. Values such as `"Day 2"` or `2.0`
/// are normalized; anything without a usable number >= 1 takes the day's position.
fn day_number(value: &Value, index: usize) -> u32 {
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 1.0).map(|f| f.trunc() as u64)),
        Value::String(s) => {
            let digits: String = s.chars().skip_while(|c| !c.is_ascii_digit()).take_while(char::is_ascii_digit).collect();
            digits.parse::<u64>().ok()
        }
        _ => None,
    };
    parsed
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n >= 1)
        .unwrap_or_else(|| u32::try_from(index + 1).unwrap_or(u32::MAX))
}

fn parse_budget(obj: &Map<String, Value>) -> BudgetBreakdown {
    let buckets = obj
        .iter()
        .filter(|(key, value)| key.as_str() != "total" && value.is_object())
        .map(|(key, value)| BudgetBucket {
            key: key.clone(),
            amount: number(value, "amount").unwrap_or(0.0),
            percentage: number(value, "percentage").unwrap_or(0.0),
        })
        .collect();
    BudgetBreakdown { total: obj.get("total").and_then(as_number), buckets }
}

fn parse_recommendations(value: &Value) -> Recommendations {
    Recommendations {
        must_visit: strings(value, "mustVisit"),
        local_food: strings(value, "localFood"),
        hidden_gems: strings(value, "hiddenGems"),
    }
}

fn parse_logistics(value: &Value) -> Logistics {
    let stays = objects(value, "suggestedStays")
        .map(|s| Stay {
            name: text(s, "name"),
            kind: text(s, "type"),
            location: text(s, "location"),
            price: number(s, "price"),
        })
        .collect();
    let dining = objects(value, "diningOptions")
        .map(|d| DiningOption {
            name: text(d, "name"),
            cuisine: text(d, "cuisine"),
            specialty: text(d, "specialty"),
            price_level: number(d, "priceLevel").or_else(|| number(d, "price")).and_then(price_level),
        })
        .collect();
    let emergency = value.get("emergency").unwrap_or(&Value::Null);
    Logistics {
        suggested_stays: stays,
        dining_options: dining,
        packing_list: strings(value, "packingList"),
        emergency: EmergencyContacts {
            embassy: text(emergency, "embassy"),
            police: text(emergency, "police"),
            hospitals: strings(emergency, "hospitals"),
        },
    }
}

fn price_level(raw: f64) -> Option<u8> {
    let level = raw.round();
    (1.0..=3.0).contains(&level).then_some(level as u8)
}

// --- Lenient field readers ---

fn text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn number(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(as_number)
}

/// Accepts JSON numbers and numeric strings such as `"$1,200"`.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').replace(',', "").parse().ok(),
        _ => None,
    }
}

fn strings(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn objects<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.as_slice())
        .unwrap_or_default()
        .iter()
        .filter(|item| item.is_object())
}
