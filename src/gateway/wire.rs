//! JSON records exchanged with the layout service, and the mapping to and
//! from the in-memory model. Wire records never leak past the gateway.

use serde::{Deserialize, Serialize};

use crate::model::{Layout, WidgetPlacement};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub layout_name: String,
    // Older servers still send the items under `layout`.
    #[serde(default, alias = "layout")]
    pub layout_items: Vec<LayoutItemRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutItemRecord {
    pub i: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_h: Option<u32>,
    #[serde(rename = "static", default, skip_serializing_if = "Option::is_none")]
    pub is_static: Option<bool>,
}

impl From<LayoutItemRecord> for WidgetPlacement {
    fn from(record: LayoutItemRecord) -> Self {
        WidgetPlacement {
            id: record.i,
            x: record.x,
            y: record.y,
            w: record.w,
            h: record.h,
            min_w: record.min_w,
            max_w: record.max_w,
            min_h: record.min_h,
            max_h: record.max_h,
            is_static: record.is_static.unwrap_or(false),
        }
    }
}

impl From<&WidgetPlacement> for LayoutItemRecord {
    fn from(item: &WidgetPlacement) -> Self {
        LayoutItemRecord {
            i: item.id.clone(),
            x: item.x,
            y: item.y,
            w: item.w,
            h: item.h,
            min_w: item.min_w,
            max_w: item.max_w,
            min_h: item.min_h,
            max_h: item.max_h,
            is_static: Some(item.is_static),
        }
    }
}

impl From<LayoutRecord> for Layout {
    fn from(record: LayoutRecord) -> Self {
        Layout {
            id: record.id,
            name: record.layout_name,
            items: record.layout_items.into_iter().map(WidgetPlacement::from).collect(),
            is_default: record.is_default.unwrap_or(false),
        }
    }
}

impl From<&Layout> for LayoutRecord {
    fn from(layout: &Layout) -> Self {
        LayoutRecord {
            id: layout.id.clone(),
            layout_name: layout.name.clone(),
            layout_items: layout.items.iter().map(LayoutItemRecord::from).collect(),
            is_default: Some(layout.is_default),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::layout_engine::geometry::GridRect;

    #[test]
    fn reads_minimal_record() {
        let record: LayoutRecord = serde_json::from_value(json!({
            "layoutName": "work",
            "layoutItems": [{ "i": "balance", "x": 0, "y": 0, "w": 12, "h": 3 }]
        }))
        .unwrap();

        let layout = Layout::from(record);
        assert_eq!(layout.id, None);
        assert_eq!(layout.name, "work");
        assert!(!layout.is_default);
        let item = &layout.items[0];
        assert!(!item.is_static);
        assert_eq!(item.min_w, None);
    }

    #[test]
    fn reads_full_record() {
        let record: LayoutRecord = serde_json::from_value(json!({
            "id": "64f1",
            "layoutName": "default",
            "isDefault": true,
            "layoutItems": [{
                "i": "timeChart", "x": 6, "y": 4, "w": 6, "h": 9,
                "minW": 5, "maxW": 12, "minH": 9, "maxH": 12, "static": true
            }]
        }))
        .unwrap();

        let layout = Layout::from(record);
        assert_eq!(layout.id.as_deref(), Some("64f1"));
        assert!(layout.is_default);
        let item = &layout.items[0];
        assert_eq!((item.x, item.y, item.w, item.h), (6, 4, 6, 9));
        assert_eq!(
            (item.min_w, item.max_w, item.min_h, item.max_h),
            (Some(5), Some(12), Some(9), Some(12))
        );
        assert!(item.is_static);
    }

    #[test]
    fn accepts_legacy_layout_field() {
        let record: LayoutRecord = serde_json::from_value(json!({
            "layoutName": "old",
            "layout": [{ "i": "a", "x": 1, "y": 2, "w": 3, "h": 4 }]
        }))
        .unwrap();
        assert_eq!(record.layout_items.len(), 1);
        assert_eq!(record.layout_items[0].i, "a");
    }

    #[test]
    fn new_layout_is_written_without_id() {
        let value = serde_json::to_value(LayoutRecord::from(&Layout::build_default())).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["layoutName"], "default");
        assert_eq!(value["isDefault"], true);
        assert_eq!(value["layoutItems"].as_array().map(Vec::len), Some(6));
        assert_eq!(value["layoutItems"][0], json!({
            "i": "balance", "x": 0, "y": 0, "w": 12, "h": 3,
            "minW": 8, "maxW": 12, "minH": 3, "maxH": 3, "static": false
        }));
    }

    #[test]
    fn unbounded_items_omit_bounds() {
        let mut layout = Layout::new("x");
        layout.id = Some("7".into());
        layout.items.push(WidgetPlacement::new("a", GridRect::new(0, 0, 2, 2)));
        let value = serde_json::to_value(LayoutRecord::from(&layout)).unwrap();
        assert_eq!(value["id"], "7");
        assert_eq!(value["layoutItems"][0], json!({
            "i": "a", "x": 0, "y": 0, "w": 2, "h": 2, "static": false
        }));
    }

    #[test]
    fn negative_coordinates_are_rejected() {
        let result = serde_json::from_value::<LayoutRecord>(json!({
            "layoutName": "bad",
            "layoutItems": [{ "i": "a", "x": -1, "y": 0, "w": 1, "h": 1 }]
        }));
        assert!(result.is_err());
    }
}
