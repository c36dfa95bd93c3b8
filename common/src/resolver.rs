//! カテゴリ照合モジュール
//!
//! 分類器の検出結果を信頼度の高い順に並べ、カテゴリ表と照合して
//! 食材名とカテゴリ名を1つ決定する。入力のみに依存する純粋関数。
//!
//! 照合ポリシーは呼び出し単位で1つに固定し、完全一致と部分一致を
//! 混在させない。バーコード検出はキーワードではなくプレフィックス規則で照合する。

use crate::category::{Category, CategoryTable};
use crate::types::{Detection, DetectionKind, Resolution};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// キーワード照合ポリシー
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// ラベルとキーワードの完全一致
    #[default]
    Exact,
    /// キーワードがラベルに含まれていれば一致
    Substring,
}

impl MatchPolicy {
    fn matches(&self, category: &Category, label: &str) -> bool {
        match self {
            MatchPolicy::Exact => category.has_keyword(label),
            MatchPolicy::Substring => category.keyword_within(label),
        }
    }
}

impl std::str::FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(MatchPolicy::Exact),
            "substring" | "contains" => Ok(MatchPolicy::Substring),
            _ => Err(format!("Unknown match policy: {}. Use exact or substring", s)),
        }
    }
}

impl std::fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchPolicy::Exact => write!(f, "exact"),
            MatchPolicy::Substring => write!(f, "substring"),
        }
    }
}

/// 照合オプション
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    pub policy: MatchPolicy,
    /// 照合を試す候補数（1なら最上位の検出のみ）
    pub max_candidates: usize,
    /// これ未満の信頼度の検出は無視する
    pub min_confidence: f32,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::Exact,
            max_candidates: 1,
            min_confidence: 0.0,
        }
    }
}

/// デフォルトオプションで照合
pub fn resolve_default(detections: &[Detection], table: &CategoryTable) -> Resolution {
    resolve(detections, table, &ResolveOptions::default())
}

/// 検出結果をカテゴリ表と照合する
///
/// - 検出が空なら Unknown/Unknown
/// - バーコード検出を先にプレフィックス規則と照合する（一致しなければ無視）
/// - ラベル/テキスト検出を信頼度の降順に並べる（同値は入力順）
/// - 候補ごとにカテゴリを定義順に調べ、最初に一致したものを返す
/// - 食材名は元のラベル表記そのまま（バーコードは規則の食材名）
pub fn resolve(
    detections: &[Detection],
    table: &CategoryTable,
    options: &ResolveOptions,
) -> Resolution {
    let (barcodes, labels): (Vec<&Detection>, Vec<&Detection>) = detections
        .iter()
        .filter(|d| above_floor(d.confidence, options.min_confidence))
        .partition(|d| d.kind == DetectionKind::Barcode);

    if let Some(resolution) = rank(barcodes)
        .into_iter()
        .find_map(|detection| match_barcode(detection, table))
    {
        return resolution;
    }

    rank(labels)
        .into_iter()
        .take(options.max_candidates.max(1))
        .find_map(|detection| match_keyword(detection, table, options.policy))
        .unwrap_or_default()
}

/// 下限が設定されていれば NaN/無限大も除外する
fn above_floor(confidence: f32, min_confidence: f32) -> bool {
    if confidence.is_finite() {
        confidence >= min_confidence
    } else {
        min_confidence <= 0.0
    }
}

/// 信頼度の降順に並べる（安定ソートなので同値は入力順）
fn rank(mut detections: Vec<&Detection>) -> Vec<&Detection> {
    detections.sort_by(|a, b| compare_confidence(b.confidence, a.confidence));
    detections
}

/// NaN/無限大は常に最下位
fn compare_confidence(a: f32, b: f32) -> Ordering {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => Ordering::Equal,
    }
}

fn match_barcode(detection: &Detection, table: &CategoryTable) -> Option<Resolution> {
    let code = detection.label.trim();
    if code.is_empty() {
        return None;
    }

    table.categories().iter().find_map(|category| {
        category
            .barcode_rule(code)
            .map(|rule| Resolution::new(rule.ingredient.clone(), category.name.clone()))
    })
}

fn match_keyword(
    detection: &Detection,
    table: &CategoryTable,
    policy: MatchPolicy,
) -> Option<Resolution> {
    let lowered = detection.label.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    table
        .categories()
        .iter()
        .find(|category| policy.matches(category, &lowered))
        .map(|category| Resolution::new(detection.label.clone(), category.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UNKNOWN;

    fn table() -> CategoryTable {
        CategoryTable::from_json(
            r#"{
                "categories": [
                    { "name": "Grains", "ingredients": ["Pasta"], "keywords": ["pasta", "noodle"],
                      "barcodes": [{ "prefix": "290000", "ingredient": "Spaghetti" }] },
                    { "name": "Vegetables", "keywords": ["tomato", "cheese"] },
                    { "name": "Dairy", "keywords": ["cheese", "milk"] }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_detections_is_unknown() {
        let r = resolve_default(&[], &table());
        assert_eq!(r, Resolution::new(UNKNOWN, UNKNOWN));
    }

    #[test]
    fn test_pasta_top_label_resolves_to_grains() {
        let detections = vec![Detection::new("Pasta", 0.91), Detection::new("Tomato", 0.4)];
        let grains_only = CategoryTable::from_json(
            r#"{"categories":[{"name":"Grains","keywords":["pasta"]}]}"#,
        )
        .unwrap();

        let r = resolve_default(&detections, &grains_only);
        assert_eq!(r, Resolution::new("Pasta", "Grains"));
    }

    #[test]
    fn test_label_casing_kept() {
        let r = resolve_default(&[Detection::new("NOODLE", 0.7)], &table());
        assert_eq!(r.ingredient, "NOODLE");
        assert_eq!(r.category, "Grains");
    }

    #[test]
    fn test_higher_confidence_first_regardless_of_order() {
        let detections = vec![Detection::new("Tomato", 0.3), Detection::new("Milk", 0.8)];
        assert_eq!(resolve_default(&detections, &table()).category, "Dairy");

        let reversed: Vec<_> = detections.into_iter().rev().collect();
        assert_eq!(resolve_default(&reversed, &table()).category, "Dairy");
    }

    #[test]
    fn test_tie_broken_by_input_order() {
        let detections = vec![Detection::new("Tomato", 0.5), Detection::new("Milk", 0.5)];
        assert_eq!(resolve_default(&detections, &table()).category, "Vegetables");
    }

    #[test]
    fn test_first_category_in_definition_order_wins() {
        let r = resolve_default(&[Detection::new("Cheese", 0.9)], &table());
        assert_eq!(r.category, "Vegetables");
    }

    #[test]
    fn test_top_candidate_only_by_default() {
        let detections = vec![Detection::new("Food", 0.95), Detection::new("Pasta", 0.9)];
        assert!(resolve_default(&detections, &table()).is_unknown());
    }

    #[test]
    fn test_max_candidates_falls_back_to_next() {
        let detections = vec![Detection::new("Food", 0.95), Detection::new("Pasta", 0.9)];
        let options = ResolveOptions {
            max_candidates: 3,
            ..Default::default()
        };
        assert_eq!(
            resolve(&detections, &table(), &options),
            Resolution::new("Pasta", "Grains")
        );
    }

    #[test]
    fn test_exact_policy_rejects_compound_label() {
        let r = resolve_default(&[Detection::new("Cheeseburger", 0.9)], &table());
        assert!(r.is_unknown());
    }

    #[test]
    fn test_substring_policy_accepts_compound_label() {
        let options = ResolveOptions {
            policy: MatchPolicy::Substring,
            ..Default::default()
        };
        let r = resolve(&[Detection::new("Cherry tomato", 0.9)], &table(), &options);
        assert_eq!(r, Resolution::new("Cherry tomato", "Vegetables"));
    }

    #[test]
    fn test_min_confidence_filters() {
        let options = ResolveOptions {
            min_confidence: 0.5,
            ..Default::default()
        };
        let r = resolve(&[Detection::new("Pasta", 0.2)], &table(), &options);
        assert!(r.is_unknown());
    }

    #[test]
    fn test_nan_confidence_ranked_last() {
        let detections = vec![Detection::new("Milk", f32::NAN), Detection::new("Pasta", 0.1)];
        assert_eq!(resolve_default(&detections, &table()).category, "Grains");
    }

    #[test]
    fn test_barcode_prefix_rule() {
        let r = resolve_default(&[Detection::barcode("2900001234567", 1.0)], &table());
        assert_eq!(r, Resolution::new("Spaghetti", "Grains"));
    }

    #[test]
    fn test_nan_dropped_when_floor_set() {
        let options = ResolveOptions {
            min_confidence: 0.5,
            ..Default::default()
        };
        let detections = vec![Detection::new("Milk", f32::NAN), Detection::new("Tomato", f32::INFINITY)];
        assert!(resolve(&detections, &table(), &options).is_unknown());
    }

    #[test]
    fn test_unmatched_digits_do_not_displace_label() {
        let detections = vec![Detection::new("Pasta", 0.95), Detection::barcode("20251231", 1.0)];
        assert_eq!(
            resolve_default(&detections, &table()),
            Resolution::new("Pasta", "Grains")
        );
    }

    #[test]
    fn test_matched_barcode_wins_over_label() {
        let detections = vec![Detection::new("Milk", 0.99), Detection::barcode("2900001234567", 0.5)];
        assert_eq!(
            resolve_default(&detections, &table()),
            Resolution::new("Spaghetti", "Grains")
        );
    }

    #[test]
    fn test_ingredient_is_label_as_given() {
        let r = resolve_default(&[Detection::new(" Pasta ", 0.9)], &table());
        assert_eq!(r, Resolution::new(" Pasta ", "Grains"));
    }

    #[test]
    fn test_text_detection_ranked_with_labels() {
        let detections = vec![Detection::text("PASTA", 0.0), Detection::new("Food", 0.9)];
        let options = ResolveOptions {
            max_candidates: 2,
            ..Default::default()
        };
        assert_eq!(
            resolve(&detections, &table(), &options),
            Resolution::new("PASTA", "Grains")
        );
    }

    #[test]
    fn test_barcode_not_matched_as_keyword() {
        let r = resolve_default(&[Detection::barcode("pasta", 1.0)], &table());
        assert!(r.is_unknown());
    }

    #[test]
    fn test_blank_label_is_unknown() {
        assert!(resolve_default(&[Detection::new("   ", 0.9)], &table()).is_unknown());
    }

    #[test]
    fn test_reload_is_deterministic() {
        let detections = vec![Detection::new("Cheese", 0.6), Detection::new("Pasta", 0.6)];
        assert_eq!(
            resolve_default(&detections, &table()),
            resolve_default(&detections, &table())
        );
    }

    #[test]
    fn test_match_policy_from_str() {
        assert_eq!("EXACT".parse::<MatchPolicy>().unwrap(), MatchPolicy::Exact);
        assert_eq!("contains".parse::<MatchPolicy>().unwrap(), MatchPolicy::Substring);
        assert!("fuzzy".parse::<MatchPolicy>().is_err());
    }
}
