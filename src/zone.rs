// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 车位定义文件: {"1": [x1, y1, x2, y2], "2": [...], ...}

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::ser::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::geometry::Rect;

/// 单个车位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub id: String,
    pub rect: Rect,
}

impl Zone {
    pub fn new(id: impl Into<String>, rect: Rect) -> Self {
        Self {
            id: id.into(),
            rect,
        }
    }
}

/// 有序车位集合 (保持文件中的键顺序)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneSet {
    zones: Vec<Zone>,
}

impl ZoneSet {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    /// 从 JSON 文本解析, 跳过 `excluded` 中的车位编号
    pub fn parse(json: &str, excluded: &[String]) -> Result<Self> {
        let map: Map<String, Value> =
            serde_json::from_str(json).context("车位文件不是 JSON 对象")?;

        let mut zones = Vec::with_capacity(map.len());
        for (id, value) in map {
            if excluded.iter().any(|x| *x == id) {
                continue;
            }
            let rect: Rect = serde_json::from_value(value)
                .map_err(|e| anyhow!("车位 {} 坐标格式错误 (需要 [x1, y1, x2, y2]): {}", id, e))?;
            zones.push(Zone { id, rect });
        }
        Ok(Self { zones })
    }

    /// 读取车位文件
    pub fn load(path: impl AsRef<Path>, excluded: &[String]) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("无法读取车位文件 {}", path.display()))?;
        let set = Self::parse(&json, excluded)?;
        log::info!("✅ 已加载 {} 个车位 ({})", set.len(), path.display());
        Ok(set)
    }

    /// 序列化为 4 空格缩进的 JSON
    pub fn to_json(&self) -> Result<String> {
        let mut map = Map::with_capacity(self.zones.len());
        for zone in &self.zones {
            map.insert(zone.id.clone(), serde_json::to_value(zone.rect)?);
        }

        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        map.serialize(&mut ser)?;
        Ok(String::from_utf8(buf)?)
    }

    /// 整体写出车位文件 (覆盖)
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)
            .with_context(|| format!("无法写入车位文件 {}", path.display()))?;
        log::info!("💾 坐标已保存到 {} ({} 个车位)", path.display(), self.len());
        Ok(())
    }

    pub fn push(&mut self, zone: Zone) {
        self.zones.push(zone);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Zone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }
}

impl<'a> IntoIterator for &'a ZoneSet {
    type Item = &'a Zone;
    type IntoIter = std::slice::Iter<'a, Zone>;

    fn into_iter(self) -> Self::IntoIter {
        self.zones.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn excluded() -> Vec<String> {
        vec!["72".to_string()]
    }

    #[test]
    fn test_parse_keeps_file_order() {
        let json = r#"{"10": [0, 0, 5, 5], "2": [5, 5, 9, 9], "1": [1, 1, 2, 2]}"#;
        let set = ZoneSet::parse(json, &[]).unwrap();
        let ids: Vec<&str> = set.iter().map(|z| z.id.as_str()).collect();
        assert_eq!(ids, ["10", "2", "1"]);
    }

    #[test]
    fn test_parse_drops_excluded() {
        let json = r#"{"71": [0, 0, 5, 5], "72": [5, 5, 9, 9], "73": [1, 1, 2, 2]}"#;
        let set = ZoneSet::parse(json, &excluded()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.get("72").is_none());
    }

    #[test]
    fn test_parse_rejects_bad_rect() {
        let err = ZoneSet::parse(r#"{"3": [1, 2, 3]}"#, &[]).unwrap_err();
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_to_json_round_trips() {
        let set = ZoneSet::new(vec![
            Zone::new("1", Rect::new(10, 20, 30, 40)),
            Zone::new("2", Rect::new(50, 60, 70, 80)),
        ]);
        let json = set.to_json().unwrap();
        assert!(json.contains("    \"1\": ["));
        assert_eq!(ZoneSet::parse(&json, &[]).unwrap(), set);
    }
}
