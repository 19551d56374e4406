//! Scrapes resource changes out of a response page.
//!
//! Only the portion before [`CAMPSITE_MARKER`] is scanned, so links and
//! labels in the campsite chrome can't be mistaken for results.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::delta::{ItemGain, StateDelta};
use crate::probes::{
    CAMPSITE_MARKER, HP_GAIN_PATTERN, HP_LOSS_PATTERN, MEAT_GAIN_PATTERN, MEAT_LOSS_PATTERN,
    MP_GAIN_PATTERN, MULTI_ITEM_PATTERN, SINGLE_ITEM_PATTERN,
};

static MEAT_GAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MEAT_GAIN_PATTERN).expect("valid regex"));
static MEAT_LOSS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MEAT_LOSS_PATTERN).expect("valid regex"));
static HP_GAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(HP_GAIN_PATTERN).expect("valid regex"));
static HP_LOSS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(HP_LOSS_PATTERN).expect("valid regex"));
static MP_GAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MP_GAIN_PATTERN).expect("valid regex"));
static SINGLE_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SINGLE_ITEM_PATTERN).expect("valid regex"));
static MULTI_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MULTI_ITEM_PATTERN).expect("valid regex"));

/// The part of a page that carries action results.
pub fn results_section(raw: &str) -> &str {
    match raw.find(CAMPSITE_MARKER) {
        Some(end) => &raw[..end],
        None => raw,
    }
}

/// Sum every numeric capture of `re` in `text`.
fn sum_matches(re: &Regex, text: &str) -> i64 {
    re.captures_iter(text)
        .filter_map(|caps| parse_amount(&caps[1]))
        .fold(0i64, |acc, n| acc.saturating_add(n))
}

fn parse_amount(raw: &str) -> Option<i64> {
    raw.replace(',', "").parse::<i64>().ok()
}

fn to_i32(amount: i64) -> i32 {
    amount.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Extract meat, HP, MP and item gains from a response.
///
/// Missing counters simply leave the corresponding field at zero.
pub fn scrape_results(raw: &str) -> StateDelta {
    let section = results_section(raw);

    let mut delta = StateDelta::new()
        .with_meat(
            sum_matches(&MEAT_GAIN_RE, section).saturating_sub(sum_matches(&MEAT_LOSS_RE, section)),
        )
        .with_hp(to_i32(
            sum_matches(&HP_GAIN_RE, section).saturating_sub(sum_matches(&HP_LOSS_RE, section)),
        ))
        .with_mp(to_i32(sum_matches(&MP_GAIN_RE, section)));

    for caps in SINGLE_ITEM_RE.captures_iter(section) {
        delta = delta.with_item(ItemGain::new(caps[1].trim(), 1));
    }

    for caps in MULTI_ITEM_RE.captures_iter(section) {
        let quantity = parse_amount(&caps[2])
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(1);
        delta = delta.with_item(ItemGain::new(caps[1].trim(), quantity));
    }

    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_ignores_text_after_campsite_marker() {
        let raw = "You gain 5 hit points.<hr>Your Campsite<br>You gain 100 Meat";
        let delta = scrape_results(raw);
        assert_eq!(delta.hp, 5);
        assert_eq!(delta.meat, 0);
    }

    #[test]
    fn scrape_reads_thousands_separators_and_losses() {
        let raw = "You gain 1,250 Meat. You spent 250 Meat. You lose 3 hit points.";
        let delta = scrape_results(raw);
        assert_eq!(delta.meat, 1000);
        assert_eq!(delta.hp, -3);
    }

    #[test]
    fn scrape_handles_mp_aliases() {
        let raw = "You gain 7 Mana Points. You gain 3 Mojo Points.";
        assert_eq!(scrape_results(raw).mp, 10);
    }

    #[test]
    fn scrape_collects_single_and_stacked_items() {
        let raw = "You acquire an item: <b>toast</b><br>You acquire <b>sugar sheet (3)</b>";
        let delta = scrape_results(raw);
        assert_eq!(
            delta.items,
            vec![ItemGain::new("toast", 1), ItemGain::new("sugar sheet", 3)]
        );
    }

    #[test]
    fn scrape_of_plain_page_is_empty() {
        assert!(scrape_results("<html>nothing happened</html>").is_empty());
    }
}
