//! Deterministic chart styling.
//!
//! Everything here is a pure function of the chart spec and its position in
//! the dashboard; there is no palette cursor to advance.

use crate::ir::{Archetype, ChartSpec, ChartStyle, StyleToken, StyledChart, Tone, ValueLabel};
use crate::palette::{self, Color};

/// Category labels containing one of these mark a current or provisional period
const EMPHASIS_MARKERS: &[&str] = &["current", "ttm", "provisional", "(p)"];

const THOUSAND: f64 = 1e3;
const TEN_THOUSAND: f64 = 1e4;
const TEN_MILLION: f64 = 1e7;

/// Decorate `spec` for slot `position_index` of `total_count` charts.
pub fn style(spec: ChartSpec, position_index: usize, total_count: usize) -> StyledChart {
    let color = palette::cyclic(position_index);
    let series_colors = (0..spec.series.len())
        .map(|i| palette::cyclic(position_index + i))
        .collect();

    let labels = spec
        .series
        .iter()
        .map(|s| {
            let token = s.token();
            s.values.iter().map(|v| v.map(|v| label_for(v, token))).collect()
        })
        .collect();

    let (element_colors, emphasized) = element_colors(&spec, position_index, color);
    let pull_out = match spec.archetype {
        Archetype::Pie => spec.series.first().and_then(|s| largest_index(&s.values)),
        _ => None,
    };

    StyledChart {
        style: ChartStyle {
            position: position_index,
            total: total_count,
            color,
            series_colors,
            element_colors,
            emphasized,
            labels,
            pull_out,
        },
        spec,
    }
}

/// Per-element fills of the primary series and the indices that got emphasis.
///
/// Precedence: sign coloring, then emphasis, then the chart color.
fn element_colors(spec: &ChartSpec, position_index: usize, color: Color) -> (Vec<Color>, Vec<usize>) {
    let count = spec.categories.len();

    if spec.archetype == Archetype::Pie {
        let colors = (0..count).map(|i| palette::cyclic(position_index + i)).collect();
        return (colors, Vec::new());
    }

    let Some(primary) = spec.series.first() else {
        return (vec![color; count], Vec::new());
    };

    if primary.token().is_signed() {
        let colors = (0..count)
            .map(|i| match primary.values.get(i).copied().flatten() {
                Some(v) if v < 0.0 => palette::DANGER,
                Some(_) => palette::SUCCESS,
                None => color,
            })
            .collect();
        return (colors, Vec::new());
    }

    let emphasized: Vec<usize> = if spec.dimension.is_some() {
        (0..count)
            .filter(|&i| i + 1 == count || has_emphasis_marker(&spec.categories[i]))
            .collect()
    } else {
        Vec::new()
    };

    let colors = (0..count)
        .map(|i| if emphasized.contains(&i) { palette::EMPHASIS } else { color })
        .collect();
    (colors, emphasized)
}

pub fn has_emphasis_marker(label: &str) -> bool {
    let lower = label.to_lowercase();
    EMPHASIS_MARKERS.iter().any(|m| lower.contains(m))
}

fn largest_index(values: &[Option<f64>]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Label text and tone for one value of a series with `token`
pub fn label_for(value: f64, token: StyleToken) -> ValueLabel {
    let tone = if !token.is_signed() {
        Tone::Neutral
    } else if value < 0.0 {
        Tone::Danger
    } else {
        Tone::Success
    };

    ValueLabel {
        text: format_value(value, token.is_percent()),
        tone,
    }
}

/// `23204` → `23.2K`, `96282000` → `9.6Cr`, `7079` → `7,079`, `17` (percent) → `17.0%`
pub fn format_value(value: f64, percent: bool) -> String {
    if percent {
        return format!("{:.1}%", value);
    }

    let magnitude = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };

    // Tier follows the rounded value: 9999.96 is 10.0K
    let tenths = (magnitude * 10.0).round();
    if tenths == 0.0 {
        return "0".to_string();
    }
    if tenths / 10.0 < TEN_THOUSAND {
        let tenths = tenths as u64;
        let whole = group_thousands(tenths / 10);
        return match tenths % 10 {
            0 => format!("{}{}", sign, whole),
            frac => format!("{}{}.{}", sign, whole, frac),
        };
    }

    let thousands = round_tenth(magnitude / THOUSAND);
    if thousands * THOUSAND < TEN_MILLION {
        format!("{}{:.1}K", sign, thousands)
    } else {
        format!("{}{:.1}Cr", sign, round_tenth(magnitude / TEN_MILLION))
    }
}

fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ColumnRole;
    use crate::ir::Series;

    fn bar_spec(categories: &[&str], values: &[f64], name: &str, signed: bool) -> ChartSpec {
        let series = Series {
            name: name.to_string(),
            role: ColumnRole::Measure,
            signed,
            values: values.iter().map(|&v| Some(v)).collect(),
        };
        ChartSpec {
            archetype: Archetype::Bar,
            dataset: "d".to_string(),
            title: "D".to_string(),
            dimension: Some("Year".to_string()),
            categories: categories.iter().map(|s| s.to_string()).collect(),
            style_token: series.token(),
            series: vec![series],
            wide: false,
            trend: None,
            warnings: vec![],
        }
    }

    #[test]
    fn test_format_thousands_abbreviation() {
        assert_eq!(format_value(23204.0, false), "23.2K");
        assert_eq!(format_value(10000.0, false), "10.0K");
        assert_eq!(format_value(962820.0, false), "962.8K");
    }

    #[test]
    fn test_format_ten_million_abbreviation() {
        assert_eq!(format_value(96_282_000.0, false), "9.6Cr");
        assert_eq!(format_value(-12_000_000.0, false), "-1.2Cr");
    }

    #[test]
    fn test_format_small_values() {
        assert_eq!(format_value(7079.0, false), "7,079");
        assert_eq!(format_value(25.2, false), "25.2");
        assert_eq!(format_value(-971.0, false), "-971");
        assert_eq!(format_value(0.0, false), "0");
    }

    #[test]
    fn test_format_tier_follows_rounding() {
        assert_eq!(format_value(9999.96, false), "10.0K");
        assert_eq!(format_value(9999.94, false), "9,999.9");
        assert_eq!(format_value(9_999_960.0, false), "1.0Cr");
        assert_eq!(format_value(-9_999_960.0, false), "-1.0Cr");
        assert_eq!(format_value(0.04, false), "0");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_value(17.0, true), "17.0%");
        assert_eq!(format_value(50.13, true), "50.1%");
    }

    #[test]
    fn test_signed_label_tones() {
        let loss = label_for(-971.0, StyleToken::Signed);
        assert_eq!(loss.text, "-971");
        assert_eq!(loss.tone, Tone::Danger);

        let gain = label_for(3.0, StyleToken::SignedPercent);
        assert_eq!(gain.text, "3.0%");
        assert_eq!(gain.tone, Tone::Success);

        assert_eq!(label_for(-5.0, StyleToken::Plain).tone, Tone::Neutral);
    }

    #[test]
    fn test_palette_cycles_by_position() {
        let spec = bar_spec(&["a", "b"], &[1.0, 2.0], "Revenue", false);
        assert_eq!(style(spec.clone(), 0, 10).style.color, palette::PALETTE[0]);
        assert_eq!(style(spec.clone(), 9, 10).style.color, palette::PALETTE[1]);
        assert_eq!(style(spec.clone(), 3, 4), style(spec, 3, 4));
    }

    #[test]
    fn test_emphasis_on_last_and_marked() {
        let spec = bar_spec(
            &["Mar 2023", "Mar 2024 (P)", "Mar 2025", "TTM"],
            &[1.0, 2.0, 3.0, 4.0],
            "Revenue",
            false,
        );
        let styled = style(spec, 2, 3);
        let base = palette::PALETTE[2];
        assert_eq!(styled.style.emphasized, vec![1, 3]);
        assert_eq!(
            styled.style.element_colors,
            vec![base, palette::EMPHASIS, base, palette::EMPHASIS]
        );
    }

    #[test]
    fn test_sign_coloring_overrides_emphasis() {
        let spec = bar_spec(&["Mar 2023", "TTM"], &[-971.0, 351.0], "Net_Profit", true);
        let styled = style(spec, 0, 1);
        assert_eq!(styled.style.element_colors, vec![palette::DANGER, palette::SUCCESS]);
        assert!(styled.style.emphasized.is_empty());
        let labels = &styled.style.labels[0];
        assert_eq!(labels[0].as_ref().map(|l| l.tone), Some(Tone::Danger));
    }

    #[test]
    fn test_pie_slices_and_pull_out() {
        let mut spec = bar_spec(&["A", "B", "C"], &[19.0, 50.0, 31.0], "Percentage", false);
        spec.archetype = Archetype::Pie;
        let styled = style(spec, 1, 2);
        assert_eq!(
            styled.style.element_colors,
            vec![palette::PALETTE[1], palette::PALETTE[2], palette::PALETTE[3]]
        );
        assert_eq!(styled.style.pull_out, Some(1));
        assert!(styled.style.emphasized.is_empty());
    }

    #[test]
    fn test_missing_values_have_no_label() {
        let mut spec = bar_spec(&["a", "b"], &[1.0, 2.0], "Revenue", false);
        spec.series[0].values[1] = None;
        let styled = style(spec, 0, 1);
        assert!(styled.style.labels[0][1].is_none());
    }
}
