// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// macroquad 画面叠加: 视频帧纹理 + 车位/检测框

use image::RgbaImage;
use macroquad::prelude::*;

use crate::geometry::Rect;
use crate::occupancy::OccupancyReport;
use crate::zone::ZoneSet;

const CYAN: Color = Color::new(0.0, 1.0, 1.0, 1.0);
const LABEL_SIZE: f32 = 20.0;

/// 帧像素坐标 ↔ 窗口坐标 (等比缩放, 居中)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Viewport {
    pub fn fit(frame_w: f32, frame_h: f32, screen_w: f32, screen_h: f32) -> Self {
        if frame_w <= 0.0 || frame_h <= 0.0 {
            return Self {
                scale: 1.0,
                offset_x: 0.0,
                offset_y: 0.0,
            };
        }
        let scale = (screen_w / frame_w).min(screen_h / frame_h);
        Self {
            scale,
            offset_x: (screen_w - frame_w * scale) / 2.0,
            offset_y: (screen_h - frame_h * scale) / 2.0,
        }
    }

    /// 按当前窗口大小适配
    pub fn for_screen(frame_w: u32, frame_h: u32) -> Self {
        Self::fit(frame_w as f32, frame_h as f32, screen_width(), screen_height())
    }

    pub fn to_screen(&self, (x, y): (i32, i32)) -> (f32, f32) {
        (
            x as f32 * self.scale + self.offset_x,
            y as f32 * self.scale + self.offset_y,
        )
    }

    pub fn to_frame(&self, (x, y): (f32, f32)) -> (i32, i32) {
        (
            ((x - self.offset_x) / self.scale).floor() as i32,
            ((y - self.offset_y) / self.scale).floor() as i32,
        )
    }

    fn draw_rect(&self, rect: &Rect, thickness: f32, color: Color) {
        let (x1, y1) = self.to_screen((rect.x1, rect.y1));
        let (x2, y2) = self.to_screen((rect.x2, rect.y2));
        draw_rectangle_lines(x1, y1, x2 - x1, y2 - y1, thickness, color);
    }

    /// 在角点处写编号, `(dx, dy)` 为屏幕像素偏移
    fn draw_label(&self, text: &str, corner: (i32, i32), (dx, dy): (f32, f32)) {
        let (x, y) = self.to_screen(corner);
        draw_text(text, x + dx, y + dy, LABEL_SIZE, WHITE);
    }
}

/// 视频帧纹理, 分辨率不变时复用
#[derive(Default)]
pub struct FrameTexture {
    texture: Option<Texture2D>,
}

impl FrameTexture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, image: &RgbaImage) {
        let (w, h) = image.dimensions();
        // 只在分辨率变化时重建纹理，否则更新像素数据
        let needs_rebuild = match &self.texture {
            Some(tex) => tex.width() != w as f32 || tex.height() != h as f32,
            None => true,
        };

        if needs_rebuild {
            let texture = Texture2D::from_rgba8(w as u16, h as u16, image.as_raw());
            texture.set_filter(FilterMode::Linear);
            self.texture = Some(texture);
        } else if let Some(tex) = &self.texture {
            tex.update(&Image {
                bytes: image.as_raw().clone(),
                width: w as u16,
                height: h as u16,
            });
        }
    }

    /// 帧尺寸 (尚无帧时为 None)
    pub fn size(&self) -> Option<(u32, u32)> {
        self.texture
            .as_ref()
            .map(|t| (t.width() as u32, t.height() as u32))
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.size().map(|(w, h)| Viewport::for_screen(w, h))
    }

    pub fn draw(&self, viewport: &Viewport) {
        if let Some(texture) = &self.texture {
            let (x, y) = (viewport.offset_x, viewport.offset_y);
            draw_texture_ex(
                texture,
                x,
                y,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(vec2(
                        texture.width() * viewport.scale,
                        texture.height() * viewport.scale,
                    )),
                    ..Default::default()
                },
            );
        }
    }
}

/// 监控画面: 车位 (红=占用 绿=空闲) + 编号 + 中心点 + 原始检测框
pub fn draw_overlay(
    viewport: &Viewport,
    zones: &ZoneSet,
    report: &OccupancyReport,
    detections: &[Rect],
) {
    for zone in zones {
        let occupied = report
            .status(&zone.id)
            .map(|s| s.is_occupied())
            .unwrap_or(false);
        let color = if occupied { RED } else { GREEN };
        viewport.draw_rect(&zone.rect, 2.0, color);
        // 编号写在框内左上角
        viewport.draw_label(&zone.id, (zone.rect.x1, zone.rect.y1), (2.0, 14.0));

        let (cx, cy) = viewport.to_screen(zone.rect.center());
        draw_circle(cx, cy, 3.0, CYAN);
    }

    for det in detections {
        viewport.draw_rect(det, 1.0, BLUE);
    }
}

/// 标注画面: 已完成的车位 + 拖动中的预览
pub fn draw_annotations(viewport: &Viewport, zones: &ZoneSet, dragging: Option<Rect>) {
    for zone in zones {
        viewport.draw_rect(&zone.rect, 2.0, GREEN);
        viewport.draw_label(&zone.id, (zone.rect.x1, zone.rect.y1), (0.0, -5.0));
    }
    if let Some(rect) = dragging {
        viewport.draw_rect(&rect, 1.0, YELLOW);
    }
}

/// 窗口左下角提示文字
pub fn draw_hint(text: &str) {
    draw_text(text, 10.0, screen_height() - 10.0, LABEL_SIZE, WHITE);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_letterbox() {
        // 1280x720 → 640x480: 等比 0.5, 上下留边 60
        let vp = Viewport::fit(1280.0, 720.0, 640.0, 480.0);
        assert_eq!(vp.scale, 0.5);
        assert_eq!(vp.offset_x, 0.0);
        assert_eq!(vp.offset_y, 60.0);
    }

    #[test]
    fn test_screen_frame_mapping() {
        let vp = Viewport::fit(1280.0, 720.0, 640.0, 480.0);
        assert_eq!(vp.to_screen((200, 100)), (100.0, 110.0));
        assert_eq!(vp.to_frame((100.0, 110.0)), (200, 100));
        assert_eq!(vp.to_frame((100.7, 110.2)), (201, 100));
    }

    #[test]
    fn test_identity_viewport() {
        let vp = Viewport::fit(640.0, 480.0, 640.0, 480.0);
        assert_eq!(vp.to_frame((33.0, 44.0)), (33, 44));
    }
}
