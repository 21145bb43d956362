// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 整数像素矩形 (车位与检测框共用)

use serde::{Deserialize, Serialize};

/// 轴对齐矩形, 两个角点 (x1, y1)-(x2, y2), 参考帧像素坐标
///
/// 序列化为 `[x1, y1, x2, y2]`, 与车位文件格式一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 由任意两个角点构造, 结果总是 (min, min)-(max, max)
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        Self {
            x1: a.0.min(b.0),
            y1: a.1.min(b.1),
            x2: a.0.max(b.0),
            y2: a.1.max(b.1),
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// 中心点 (整数除法, 向零截断)
    pub fn center(&self) -> (i32, i32) {
        ((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    /// 虚拟框: 每边向内收缩 宽/高 的 1/6
    ///
    /// 极小车位会得到退化甚至反转的矩形, 这里不做修正
    pub fn virtual_box(&self) -> Rect {
        let margin_x = self.width() / 6;
        let margin_y = self.height() / 6;
        Rect {
            x1: self.x1 + margin_x,
            y1: self.y1 + margin_y,
            x2: self.x2 - margin_x,
            y2: self.y2 - margin_y,
        }
    }

    /// 点是否在框内 (含边界)
    pub fn contains_point(&self, (x, y): (i32, i32)) -> bool {
        self.x1 <= x && x <= self.x2 && self.y1 <= y && y <= self.y2
    }

    /// 两框是否相交 (任一轴完全分离才算不相交, 贴边算相交)
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.x2 < other.x1 || self.x1 > other.x2 || self.y2 < other.y1 || self.y1 > other.y2)
    }
}

impl From<[i32; 4]> for Rect {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<Rect> for [i32; 4] {
    fn from(r: Rect) -> Self {
        [r.x1, r.y1, r.x2, r.y2]
    }
}
