// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 鼠标标注车位: 按下 → 拖动 → 松开 定义一个矩形
// 状态显式传入事件处理函数并返回更新后的值

use crate::geometry::Rect;
use crate::zone::{Zone, ZoneSet};

/// 鼠标事件 (帧像素坐标)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEvent {
    Press((i32, i32)),
    Drag((i32, i32)),
    Release((i32, i32)),
}

impl MouseEvent {
    /// 一帧内的左键状态 → 事件序列 (按下 → 拖动 → 松开)
    ///
    /// 同一帧内按下又松开时依次产生 Press 和 Release
    pub fn from_buttons(pressed: bool, down: bool, released: bool, pos: (i32, i32)) -> Vec<Self> {
        let mut events = Vec::with_capacity(2);
        if pressed {
            events.push(MouseEvent::Press(pos));
        }
        if down && !pressed && !released {
            events.push(MouseEvent::Drag(pos));
        }
        if released {
            events.push(MouseEvent::Release(pos));
        }
        events
    }
}

/// 进行中的拖动
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Drag {
    start: (i32, i32),
    current: (i32, i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatorState {
    zones: ZoneSet,
    next_id: u32,
    drag: Option<Drag>,
}

impl Default for AnnotatorState {
    fn default() -> Self {
        Self {
            zones: ZoneSet::default(),
            next_id: 1,
            drag: None,
        }
    }
}

impl AnnotatorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 处理一个鼠标事件
    ///
    /// 没有先按下的拖动/松开被忽略
    pub fn handle(mut self, event: MouseEvent) -> Self {
        match event {
            MouseEvent::Press(p) => {
                self.drag = Some(Drag {
                    start: p,
                    current: p,
                });
            }
            MouseEvent::Drag(p) => {
                if let Some(drag) = self.drag.as_mut() {
                    drag.current = p;
                }
            }
            MouseEvent::Release(p) => {
                if let Some(drag) = self.drag.take() {
                    let id = self.next_id.to_string();
                    let rect = Rect::from_corners(drag.start, p);
                    log::info!("📐 车位 {}: {:?}", id, <[i32; 4]>::from(rect));
                    self.zones.push(Zone::new(id, rect));
                    self.next_id += 1;
                }
            }
        }
        self
    }

    pub fn zones(&self) -> &ZoneSet {
        &self.zones
    }

    pub fn into_zones(self) -> ZoneSet {
        self.zones
    }

    /// 拖动中的矩形 (预览用)
    pub fn dragging_rect(&self) -> Option<Rect> {
        self.drag.map(|d| Rect::from_corners(d.start, d.current))
    }
}
