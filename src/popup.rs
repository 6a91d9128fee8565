use geo::Coord;

use crate::data::RegionSummary;
use crate::legend::fmt2;
use crate::style::PointBucket;

/// Treść dymka, renderowana dopiero w `ui`
#[derive(Clone, Debug, PartialEq)]
pub enum PopupContent {
    Region {
        name: String,
        summary: RegionSummary,
    },
    Point {
        name: String,
        position: String,
        value: f64,
        bucket: PointBucket,
    },
}

impl PopupContent {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Region { .. } => "Region Info",
            Self::Point { .. } => "Point Info",
        }
    }

    /// Pary etykieta/wartość w kolejności wyświetlania
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Region { name, summary } => vec![
                ("Region", name.clone()),
                ("Minimum", fmt2(summary.min)),
                ("Average", fmt2(summary.avg)),
                ("Median", fmt2(summary.med)),
                ("Maximum", fmt2(summary.max)),
            ],
            Self::Point { name, position, value, bucket } => vec![
                ("Region", name.clone()),
                ("Position", position.clone()),
                ("Value", fmt2(*value)),
                ("Class", bucket.label().to_string()),
            ],
        }
    }
}

/// Dymek zakotwiczony we współrzędnej mapy; widoczny tylko z kotwicą
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PopupState {
    anchor: Option<Coord<f64>>,
    content: Option<PopupContent>,
}

impl PopupState {
    pub fn show(&mut self, anchor: Coord<f64>, content: PopupContent) {
        self.anchor = Some(anchor);
        self.content = Some(content);
    }

    pub fn close(&mut self) {
        self.anchor = None;
        self.content = None;
    }

    pub fn is_visible(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn anchor(&self) -> Option<Coord<f64>> {
        self.anchor
    }

    pub fn content(&self) -> Option<&PopupContent> {
        self.anchor.and(self.content.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_is_idempotent() {
        let mut popup = PopupState::default();
        popup.show(
            Coord { x: 15.0, y: 47.0 },
            PopupContent::Point {
                name: "Styria".into(),
                position: "47° 00′ 00″ N 15° 00′ 00″ E".into(),
                value: 4.0,
                bucket: PointBucket::Equal,
            },
        );
        assert!(popup.is_visible());

        popup.close();
        let after_first = popup.clone();
        popup.close();
        assert_eq!(popup, after_first);
        assert!(!popup.is_visible());
        assert!(popup.content().is_none());
    }

    #[test]
    fn region_rows_use_two_decimals() {
        let content = PopupContent::Region {
            name: "Styria".into(),
            summary: RegionSummary { min: 1.0, max: 9.0, avg: 5.0, med: 4.0 },
        };
        assert_eq!(content.title(), "Region Info");
        let rows = content.rows();
        assert_eq!(rows[1], ("Minimum", "1.00".to_string()));
        assert_eq!(rows[4], ("Maximum", "9.00".to_string()));
    }
}
