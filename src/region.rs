//! Region classification for Chinese location text
//!
//! Splits a country string such as `浙江省杭州市` into country, province and
//! city. Provinces are found by their `省` suffix; autonomous regions,
//! municipalities and special administrative regions by a table of name
//! prefixes, each with its own slicing rule. Text that matches nothing
//! (foreign countries, ISP names) yields an empty [`Region`].
//!
//! ```
//! use ipseek::region::{classify, Region};
//!
//! let region = classify("浙江省杭州市");
//! assert_eq!(region.country.as_deref(), Some("中国"));
//! assert_eq!(region.province.as_deref(), Some("浙江省"));
//! assert_eq!(region.city.as_deref(), Some("杭州市"));
//!
//! assert_eq!(classify("美国"), Region::default());
//! ```

use serde::Serialize;

const CHINA: &str = "中国";
const PROVINCE_MARKER: char = '省';
const CITY_MARKERS: [char; 3] = ['市', '区', '县'];

/// Text the database uses for private address space
const LAN_MARKER: &str = "局域网";
/// Province reported for private address space
const LAN_PROVINCE: &str = "上海";

/// Country / province / city decomposition of a location string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Region {
    /// Country name
    pub country: Option<String>,
    /// Province-level division
    pub province: Option<String>,
    /// City-level division
    pub city: Option<String>,
}

impl Region {
    /// True if nothing was recognised
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.province.is_none() && self.city.is_none()
    }

    fn china(province: &str, city: Option<&str>) -> Self {
        Self {
            country: Some(CHINA.to_string()),
            province: Some(province.to_string()),
            city: city.map(str::to_string),
        }
    }
}

/// Kind of province-level division matched by prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivisionKind {
    /// 自治区
    AutonomousRegion,
    /// 直辖市
    Municipality,
    /// 特别行政区
    SpecialAdministrativeRegion,
}

impl DivisionKind {
    /// How text below a division of this kind is cut
    pub const fn slice_rule(self) -> SliceRule {
        match self {
            DivisionKind::AutonomousRegion => SliceRule::CityAfterName,
            DivisionKind::Municipality => SliceRule::SelfAsCity,
            DivisionKind::SpecialAdministrativeRegion => SliceRule::ProvinceOnly,
        }
    }
}

/// How the rest of the text is cut once a prefix matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceRule {
    /// The city is the text after the division name, up to and including
    /// the first city marker
    CityAfterName,
    /// The division is itself a city; city and province are the same
    SelfAsCity,
    /// No city below the division
    ProvinceOnly,
}

/// One row of the division table
#[derive(Debug, Clone, Copy)]
pub struct Division {
    /// Leading characters that identify the division
    pub prefix: &'static str,
    /// Full official name, stripped when present in the text
    pub full_name: &'static str,
    /// Administrative kind, which decides the slicing rule
    pub kind: DivisionKind,
}

const fn division(prefix: &'static str, full_name: &'static str, kind: DivisionKind) -> Division {
    Division {
        prefix,
        full_name,
        kind,
    }
}

/// Province-level divisions without a `省` suffix, checked in order
pub const DIVISIONS: &[Division] = &[
    division("内蒙古", "内蒙古自治区", DivisionKind::AutonomousRegion),
    division("广西", "广西壮族自治区", DivisionKind::AutonomousRegion),
    division("西藏", "西藏自治区", DivisionKind::AutonomousRegion),
    division("宁夏", "宁夏回族自治区", DivisionKind::AutonomousRegion),
    division("新疆", "新疆维吾尔自治区", DivisionKind::AutonomousRegion),
    division("北京", "北京市", DivisionKind::Municipality),
    division("上海", "上海市", DivisionKind::Municipality),
    division("天津", "天津市", DivisionKind::Municipality),
    division("重庆", "重庆市", DivisionKind::Municipality),
    division("香港", "香港特别行政区", DivisionKind::SpecialAdministrativeRegion),
    division("澳门", "澳门特别行政区", DivisionKind::SpecialAdministrativeRegion),
];

/// Decompose a country string into a [`Region`]
///
/// Best effort: unrecognised text gives an empty region, partially
/// recognised text a partial one.
pub fn classify(country: &str) -> Region {
    let text = country.trim();
    if text.contains(LAN_MARKER) {
        return Region {
            country: Some(CHINA.to_string()),
            province: Some(LAN_PROVINCE.to_string()),
            city: None,
        };
    }

    let text = text.strip_prefix(CHINA).unwrap_or(text);
    if text.is_empty() {
        return Region::default();
    }

    if let Some(idx) = text.find(PROVINCE_MARKER) {
        let split = idx + PROVINCE_MARKER.len_utf8();
        let (province, rest) = text.split_at(split);
        return Region::china(province, city_prefix(rest));
    }

    DIVISIONS
        .iter()
        .find(|d| text.starts_with(d.prefix))
        .map(|d| apply_division(d, text))
        .unwrap_or_default()
}

fn apply_division(division: &Division, text: &str) -> Region {
    match division.kind.slice_rule() {
        SliceRule::CityAfterName => {
            let rest = text
                .strip_prefix(division.full_name)
                .or_else(|| text.strip_prefix(division.prefix))
                .unwrap_or("");
            Region::china(division.prefix, city_prefix(rest))
        }
        SliceRule::SelfAsCity => Region::china(division.full_name, Some(division.full_name)),
        SliceRule::ProvinceOnly => Region::china(division.prefix, None),
    }
}

/// Leading text up to and including the first city marker
fn city_prefix(text: &str) -> Option<&str> {
    let (idx, marker) = text.char_indices().find(|(_, c)| CITY_MARKERS.contains(c))?;
    if idx == 0 {
        return None;
    }
    Some(&text[..idx + marker.len_utf8()])
}
