// src/apd/form.rs
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::utils::error::ExtractError;

const DEFAULT_ACTION: &str = "/database/result";

static FORM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("form").expect("Failed to compile FORM_SELECTOR"));
static INPUT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input").expect("Failed to compile INPUT_SELECTOR"));
static SELECT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("select").expect("Failed to compile SELECT_SELECTOR"));
static SELECTED_OPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("option[selected]").expect("Failed to compile SELECTED_OPTION_SELECTOR")
});
static OPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("option").expect("Failed to compile OPTION_SELECTOR"));
static TEXTAREA_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("textarea").expect("Failed to compile TEXTAREA_SELECTOR"));

/// The search form as a browser would submit it with no filters filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchForm {
    pub action_url: Url,
    pub payload: Vec<(String, String)>,
}

/// Locates the form posting to the result listing and captures its default values.
pub fn find_search_form(html: &str, page_url: &Url) -> Result<SearchForm, ExtractError> {
    let document = Html::parse_document(html);

    let form = document
        .select(&FORM_SELECTOR)
        .find(|f| {
            let action = f.value().attr("action").unwrap_or("").trim();
            action.contains("database/result") || action.ends_with("/result")
        })
        .ok_or(ExtractError::SearchFormNotFound)?;

    let action = form
        .value()
        .attr("action")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_ACTION);
    let action_url = page_url
        .join(action)
        .map_err(|_| ExtractError::SearchFormNotFound)?;

    let payload = build_form_payload(form);
    tracing::debug!("Search form posts {} fields to {}", payload.len(), action_url);

    Ok(SearchForm { action_url, payload })
}

/// Field values of `form`: inputs, then selects, then textareas.
/// Unchecked boxes and unnamed controls are left out.
pub fn build_form_payload(form: ElementRef) -> Vec<(String, String)> {
    let mut data = Vec::new();

    for input in form.select(&INPUT_SELECTOR) {
        let el = input.value();
        let Some(name) = el.attr("name").filter(|n| !n.is_empty()) else {
            continue;
        };
        let kind = el.attr("type").unwrap_or("text").to_lowercase();

        match kind.as_str() {
            "submit" | "button" | "image" => {
                if let Some(value) = el.attr("value") {
                    data.push((name.to_string(), value.to_string()));
                }
            }
            "checkbox" | "radio" => {
                if el.attr("checked").is_some() {
                    data.push((name.to_string(), el.attr("value").unwrap_or("on").to_string()));
                }
            }
            _ => data.push((name.to_string(), el.attr("value").unwrap_or("").to_string())),
        }
    }

    for select in form.select(&SELECT_SELECTOR) {
        let Some(name) = select.value().attr("name").filter(|n| !n.is_empty()) else {
            continue;
        };
        let option = select
            .select(&SELECTED_OPTION_SELECTOR)
            .next()
            .or_else(|| select.select(&OPTION_SELECTOR).next());
        let value = match option {
            Some(opt) => match opt.value().attr("value").filter(|v| !v.is_empty()) {
                Some(v) => v.to_string(),
                None => opt.text().collect::<String>().trim().to_string(),
            },
            None => String::new(),
        };
        data.push((name.to_string(), value));
    }

    for area in form.select(&TEXTAREA_SELECTOR) {
        let Some(name) = area.value().attr("name").filter(|n| !n.is_empty()) else {
            continue;
        };
        data.push((name.to_string(), area.text().collect()));
    }

    data
}
