//! 时间戳槽位：刷新（读取元数据并格式化）与渲染（写入状态栏）

use crate::model::host::{DocumentStat, StatusItem, TimestampFormatter};
use crate::model::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Created,
    LastModified,
}

impl SlotKind {
    /// 状态栏中的排列顺序
    pub const ALL: [SlotKind; 2] = [SlotKind::LastModified, SlotKind::Created];

    pub fn index(self) -> usize {
        match self {
            SlotKind::LastModified => 0,
            SlotKind::Created => 1,
        }
    }

    /// 该槽位读取的元数据字段
    pub fn instant_of(self, stat: &DocumentStat) -> i64 {
        match self {
            SlotKind::Created => stat.ctime_ms,
            SlotKind::LastModified => stat.mtime_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub kind: SlotKind,
    pub enabled: bool,
    pub prepend_label: String,
    pub timestamp_format: String,
    pub current_value: Option<String>,
}

/// 一次刷新的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Refreshed {
    pub value: Option<String>,
    pub changed: bool,
}

impl Slot {
    pub fn from_settings(kind: SlotKind, settings: &Settings) -> Self {
        let mut slot = Self {
            kind,
            enabled: false,
            prepend_label: String::new(),
            timestamp_format: String::new(),
            current_value: None,
        };
        slot.apply_settings(settings);
        slot
    }

    /// 同步设置中的开关、前缀与格式；已有的时间戳保留
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.enabled = settings.enabled(self.kind);
        self.prepend_label = settings.prepend(self.kind).to_string();
        self.timestamp_format = settings.timestamp_format(self.kind).to_string();
    }

    /// 状态栏上应显示的文本
    pub fn display_text(&self) -> Option<String> {
        self.current_value
            .as_ref()
            .map(|value| format!("{}{}", self.prepend_label, value))
    }
}

/// 读取文档元数据并格式化；没有活动文档时保留旧值
pub fn refresh(
    slot: &mut Slot,
    document: Option<&DocumentStat>,
    formatter: &dyn TimestampFormatter,
) -> Refreshed {
    let Some(stat) = document else {
        return Refreshed {
            value: slot.current_value.clone(),
            changed: false,
        };
    };

    let formatted = formatter.format(slot.kind.instant_of(stat), &slot.timestamp_format);
    let changed = slot.current_value.as_deref() != Some(formatted.as_str());
    slot.current_value = Some(formatted);
    Refreshed {
        value: slot.current_value.clone(),
        changed,
    }
}

/// 将槽位写入状态栏元素：启用且有值时显示，禁用时隐藏，其余情况不动
pub fn render(slot: &Slot, item: &mut dyn StatusItem, clickable: bool) {
    if slot.enabled {
        if let Some(text) = slot.display_text() {
            item.set_text(&text);
            item.set_clickable(clickable);
            item.show();
        }
    } else {
        item.hide();
    }
}
