// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 车位占用判定
//
// 判定规则 (两项同时满足才算占用):
//   1. 车位中心点落在检测框内 (含边界)
//   2. 检测框与车位的虚拟框 (每边收缩 1/6) 相交
// 任一检测框满足即为占用

use serde::Serialize;

use crate::geometry::Rect;
use crate::zone::ZoneSet;

/// 单个车位状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStatus {
    Occupied,
    Available,
}

impl ZoneStatus {
    pub fn is_occupied(&self) -> bool {
        matches!(self, ZoneStatus::Occupied)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneStatus::Occupied => "occupied",
            ZoneStatus::Available => "available",
        }
    }
}

/// 报告中的一项 `{"id": ..., "status": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupancyEntry {
    pub id: String,
    pub status: ZoneStatus,
}

/// 单帧占用报告, 每个车位恰好一项, 顺序与车位集合一致
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OccupancyReport {
    entries: Vec<OccupancyEntry>,
}

impl OccupancyReport {
    pub fn entries(&self) -> &[OccupancyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status(&self, id: &str) -> Option<ZoneStatus> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.status)
    }

    pub fn occupied(&self) -> usize {
        self.entries.iter().filter(|e| e.status.is_occupied()).count()
    }

    pub fn available(&self) -> usize {
        self.len() - self.occupied()
    }
}

/// 车位是否被任一检测框占用
pub fn is_occupied(zone: &Rect, detections: &[Rect]) -> bool {
    let center = zone.center();
    let virtual_box = zone.virtual_box();
    detections
        .iter()
        .any(|det| det.contains_point(center) && det.intersects(&virtual_box))
}

/// 对所有车位逐一判定, 生成本帧报告
pub fn evaluate(zones: &ZoneSet, detections: &[Rect]) -> OccupancyReport {
    let entries = zones
        .iter()
        .map(|zone| OccupancyEntry {
            id: zone.id.clone(),
            status: if is_occupied(&zone.rect, detections) {
                ZoneStatus::Occupied
            } else {
                ZoneStatus::Available
            },
        })
        .collect();
    OccupancyReport { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::Zone;

    const ZONE: Rect = Rect::new(100, 100, 200, 200);

    #[test]
    fn test_snug_detection_occupies() {
        assert!(is_occupied(&ZONE, &[Rect::new(120, 120, 180, 180)]));
    }

    #[test]
    fn test_far_detection_is_available() {
        assert!(!is_occupied(&ZONE, &[Rect::new(0, 0, 50, 50)]));
    }

    #[test]
    fn test_covering_detection_occupies() {
        assert!(is_occupied(&ZONE, &[Rect::new(0, 0, 500, 500)]));
    }

    #[test]
    fn test_overlap_without_center_is_available() {
        // 与虚拟框 (116..184) 相交但不含中心 (150, 150)
        assert!(!is_occupied(&ZONE, &[Rect::new(90, 90, 140, 140)]));
    }

    #[test]
    fn test_center_without_overlap_is_available() {
        // 正常车位的中心总在虚拟框内, 只有反转车位能构造出"含中心但不相交"
        let inverted_zone = Rect::new(200, 200, 100, 100);
        assert_eq!(inverted_zone.center(), (150, 150));
        let det = Rect::new(150, 150, 150, 150);
        assert!(det.contains_point(inverted_zone.center()));
        let vb = inverted_zone.virtual_box();
        assert_eq!(vb, Rect::new(184, 184, 116, 116));
        assert!(!det.intersects(&vb));
        assert!(!is_occupied(&inverted_zone, &[det]));
    }

    #[test]
    fn test_any_detection_suffices() {
        let dets = [Rect::new(0, 0, 10, 10), Rect::new(140, 140, 160, 160)];
        assert!(is_occupied(&ZONE, &dets));
    }

    #[test]
    fn test_no_detections_all_available() {
        let zones = ZoneSet::new(vec![Zone::new("1", ZONE), Zone::new("2", Rect::new(0, 0, 10, 10))]);
        let report = evaluate(&zones, &[]);
        assert_eq!(report.len(), 2);
        assert_eq!(report.occupied(), 0);
        assert_eq!(report.available(), 2);
    }

    #[test]
    fn test_report_order_and_json() {
        let zones = ZoneSet::new(vec![
            Zone::new("5", ZONE),
            Zone::new("6", Rect::new(300, 300, 400, 400)),
        ]);
        let report = evaluate(&zones, &[Rect::new(120, 120, 180, 180)]);
        assert_eq!(report.status("5"), Some(ZoneStatus::Occupied));
        assert_eq!(report.status("6"), Some(ZoneStatus::Available));
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"[{"id":"5","status":"occupied"},{"id":"6","status":"available"}]"#
        );
    }

    #[test]
    fn test_deterministic() {
        let dets = [Rect::new(120, 120, 180, 180), Rect::new(90, 90, 140, 140)];
        let first = is_occupied(&ZONE, &dets);
        for _ in 0..10 {
            assert_eq!(is_occupied(&ZONE, &dets), first);
        }
    }
}
