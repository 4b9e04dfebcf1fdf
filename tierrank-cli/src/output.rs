/// Output formatting: terminal table and JSON.
use anyhow::Result;
use serde::Serialize;
use tierrank_core::{Category, RankedItem, RankingState};

#[derive(Serialize)]
struct JsonRankedItem<'a> {
    rank: usize,
    id: i64,
    title: &'a str,
    category: Category,
    score: Option<f64>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    items: Vec<JsonRankedItem<'a>>,
    total_items: usize,
    scores_visible: bool,
}

#[derive(Serialize)]
struct JsonPlacement<'a> {
    item: JsonRankedItem<'a>,
    category_rank: usize,
    category_size: usize,
    comparisons: usize,
}

fn json_item(item: &RankedItem) -> JsonRankedItem<'_> {
    JsonRankedItem {
        rank: item.global_rank,
        id: item.id,
        title: &item.title,
        category: item.category,
        score: item.score,
    }
}

fn score_cell(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |s| format!("{s:.1}"))
}

fn selected<'a>(state: &'a RankingState, only: Option<Category>) -> Vec<&'a RankedItem> {
    state
        .ranked()
        .filter(|item| only.is_none_or(|c| item.category == c))
        .collect()
}

/// Render the ranking as a table.
pub fn render_table(state: &RankingState, only: Option<Category>) -> String {
    let items = selected(state, only);
    if items.is_empty() {
        return "Nothing ranked yet.\n".to_string();
    }

    let title_width = items.iter().map(|i| i.title.chars().count()).max().unwrap_or(5).max(5);

    let mut out = String::new();
    out.push_str(&format!("  # | {:<title_width$} | Category | Score\n", "Title"));
    out.push_str(&format!("----|-{}-|----------|------\n", "-".repeat(title_width)));
    for item in &items {
        out.push_str(&format!(
            "{:>3} | {:<title_width$} | {:<8} | {:>5}\n",
            item.global_rank,
            item.title,
            item.category.as_str(),
            score_cell(item.score),
        ));
    }

    out.push_str(&format!("\n{} titles ranked", state.total_count()));
    if !state.scores_visible() {
        let remaining = state
            .policy()
            .visibility_threshold
            .saturating_sub(state.total_count());
        out.push_str(&format!(" (scores appear after {remaining} more)"));
    }
    out.push('\n');
    out
}

/// Render the ranking as JSON.
pub fn render_json(state: &RankingState, only: Option<Category>) -> Result<String> {
    let output = JsonOutput {
        items: selected(state, only).into_iter().map(json_item).collect(),
        total_items: state.total_count(),
        scores_visible: state.scores_visible(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Describe where a freshly inserted item landed.
pub fn render_placement(
    item: &RankedItem,
    state: &RankingState,
    comparisons: usize,
    json: bool,
) -> Result<String> {
    let category_size = state.list(item.category).len();
    let category_rank = state
        .list(item.category)
        .iter()
        .position(|id| *id == item.id)
        .map_or(0, |p| p + 1);

    if json {
        let placement = JsonPlacement {
            item: json_item(item),
            category_rank,
            category_size,
            comparisons,
        };
        return Ok(serde_json::to_string_pretty(&placement)?);
    }

    let mut line = format!(
        "\"{}\" is #{category_rank} of {category_size} in {} (#{} overall",
        item.title, item.category, item.global_rank
    );
    if let Some(score) = item.score {
        line.push_str(&format!(", score {score:.1}"));
    }
    line.push_str(&format!(") after {comparisons} comparison(s)."));
    Ok(line)
}
