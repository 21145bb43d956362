// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 监控配置 - 通过JSON文件调整参数, 命令行参数可覆盖

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::YOLOv8Config;

/// 监控参数配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    // === 输入输出 ===
    pub video: String,    // 本地视频文件
    pub zones: String,    // 车位定义文件
    pub endpoint: String, // 占用报告接收地址

    // === 车位 ===
    pub excluded_zones: Vec<String>, // 加载时剔除的车位编号

    // === 循环 ===
    pub frame_delay_ms: u64,  // 每帧显示间隔
    pub http_timeout_ms: u64, // 单次上报超时

    // === 检测参数 ===
    pub detector: YOLOv8Config,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            video: "carPark.mov".to_string(),
            zones: "zones.json".to_string(),
            endpoint: "http://127.0.0.1:5000/actualizar".to_string(),
            excluded_zones: vec!["72".to_string()],
            frame_delay_ms: 120,
            http_timeout_ms: 5000,
            detector: YOLOv8Config::default(),
        }
    }
}

impl MonitorConfig {
    /// 从JSON文件加载配置, 文件不存在时写出默认配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => {
                let config = serde_json::from_str(&json)
                    .with_context(|| format!("配置文件解析失败: {}", path.display()))?;
                log::info!("✅ 配置已从 {} 加载", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("📝 配置文件不存在,创建默认配置...");
                let config = Self::default();
                config.save(path)?;
                Ok(config)
            }
            Err(e) => {
                Err(e).with_context(|| format!("无法读取配置文件 {}", path.display()))
            }
        }
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("保存配置失败: {}", path.display()))?;
        log::info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        log::info!("🎛️  当前监控配置:");
        log::info!("  视频: {}", self.video);
        log::info!("  车位文件: {} (剔除 {:?})", self.zones, self.excluded_zones);
        log::info!("  上报地址: {}", self.endpoint);
        log::info!("  模型: {}", self.detector.model);
        log::info!(
            "  置信度: {:.3} | IOU: {:.2} | 输入尺寸: {}",
            self.detector.conf,
            self.detector.iou,
            self.detector.imgsz
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: MonitorConfig =
            serde_json::from_str(r#"{"endpoint": "http://10.0.0.2:5000/actualizar"}"#).unwrap();
        assert_eq!(config.endpoint, "http://10.0.0.2:5000/actualizar");
        assert_eq!(config.excluded_zones, vec!["72".to_string()]);
        assert_eq!(config.frame_delay_ms, 120);
        assert_eq!(config.detector.conf, 0.019);
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smartpark.json");
        let config = MonitorConfig::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.detector.iou, 0.5);

        let reloaded = MonitorConfig::load(&path).unwrap();
        assert_eq!(reloaded.video, config.video);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smartpark.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(MonitorConfig::load(&path).is_err());
    }
}
