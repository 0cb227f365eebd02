//! 插件设置：默认值、与持久化数据的逐字段合并、点击循环状态机

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::data_core::AppError;
use crate::model::slot::SlotKind;

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "YYYY-MM-DD H:mm:ss";
pub const DEFAULT_CREATED_PREPEND: &str = "Created: ";
pub const DEFAULT_LAST_MODIFIED_PREPEND: &str = "Last Modified: ";
pub const DEFAULT_REFRESH_INTERVAL_SECS: f64 = 2.0;

pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(100);
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// 持久化字段名与原插件 data.json 保持一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub created_enabled: bool,
    pub created_prepend: String,
    pub created_timestamp_format: String,
    pub last_modified_enabled: bool,
    pub last_modified_prepend: String,
    pub last_modified_timestamp_format: String,
    pub cycle_on_click_enabled: bool,
    /// 刷新间隔（秒）
    pub refresh_interval: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            created_enabled: true,
            created_prepend: DEFAULT_CREATED_PREPEND.to_string(),
            created_timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            last_modified_enabled: true,
            last_modified_prepend: DEFAULT_LAST_MODIFIED_PREPEND.to_string(),
            last_modified_timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            cycle_on_click_enabled: false,
            refresh_interval: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

/// 设置面板上的一次修改
#[derive(Debug, Clone, PartialEq)]
pub enum SettingChange {
    Enabled(SlotKind, bool),
    Prepend(SlotKind, String),
    TimestampFormat(SlotKind, String),
    CycleOnClick(bool),
    RefreshInterval(Duration),
}

impl SettingChange {
    /// 需要重新刷新/渲染的槽位
    pub fn affected_slots(&self) -> Vec<SlotKind> {
        match self {
            Self::Enabled(kind, _) | Self::Prepend(kind, _) | Self::TimestampFormat(kind, _) => {
                vec![*kind]
            }
            // 点击绑定随渲染一起更新
            Self::CycleOnClick(_) => SlotKind::ALL.to_vec(),
            Self::RefreshInterval(_) => Vec::new(),
        }
    }
}

impl Settings {
    /// 将持久化数据逐字段覆盖到默认值上
    ///
    /// 缺失字段、类型不符的字段保留默认值，未知字段忽略
    pub fn merge_with_defaults(persisted: Option<&Value>) -> Self {
        let defaults = Self::default();
        let Some(persisted) = persisted else {
            return defaults;
        };
        let Some(overrides) = persisted.as_object() else {
            tracing::warn!("持久化设置不是JSON对象，使用默认设置");
            return defaults;
        };
        let Ok(Value::Object(base)) = serde_json::to_value(&defaults) else {
            return defaults;
        };

        let mut merged = Map::with_capacity(base.len());
        for (key, default_value) in base {
            let value = match overrides.get(&key) {
                Some(v) if same_json_kind(v, &default_value) => v.clone(),
                Some(v) => {
                    tracing::warn!("设置字段 {} 类型不符（{}），使用默认值", key, v);
                    default_value
                }
                None => default_value,
            };
            merged.insert(key, value);
        }

        match serde_json::from_value(Value::Object(merged)) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("设置合并失败: {}，使用默认设置", e);
                defaults
            }
        }
    }

    pub fn enabled(&self, kind: SlotKind) -> bool {
        match kind {
            SlotKind::Created => self.created_enabled,
            SlotKind::LastModified => self.last_modified_enabled,
        }
    }

    pub fn set_enabled(&mut self, kind: SlotKind, enabled: bool) {
        match kind {
            SlotKind::Created => self.created_enabled = enabled,
            SlotKind::LastModified => self.last_modified_enabled = enabled,
        }
    }

    pub fn prepend(&self, kind: SlotKind) -> &str {
        match kind {
            SlotKind::Created => &self.created_prepend,
            SlotKind::LastModified => &self.last_modified_prepend,
        }
    }

    pub fn timestamp_format(&self, kind: SlotKind) -> &str {
        match kind {
            SlotKind::Created => &self.created_timestamp_format,
            SlotKind::LastModified => &self.last_modified_timestamp_format,
        }
    }

    /// 生效的刷新间隔，限制在 [MIN_REFRESH_INTERVAL, MAX_REFRESH_INTERVAL]
    pub fn refresh_interval(&self) -> Duration {
        clamp_interval_secs(self.refresh_interval)
    }

    pub fn apply(&mut self, change: &SettingChange) {
        match change {
            SettingChange::Enabled(kind, enabled) => self.set_enabled(*kind, *enabled),
            SettingChange::Prepend(SlotKind::Created, v) => self.created_prepend = v.clone(),
            SettingChange::Prepend(SlotKind::LastModified, v) => {
                self.last_modified_prepend = v.clone()
            }
            SettingChange::TimestampFormat(SlotKind::Created, v) => {
                self.created_timestamp_format = v.clone()
            }
            SettingChange::TimestampFormat(SlotKind::LastModified, v) => {
                self.last_modified_timestamp_format = v.clone()
            }
            SettingChange::CycleOnClick(v) => self.cycle_on_click_enabled = *v,
            SettingChange::RefreshInterval(d) => self.refresh_interval = d.as_secs_f64(),
        }
    }

    /// 按循环规则切换两个显示开关
    pub fn cycle_enabled(&mut self) {
        let (lm, c) = next_cycle_state(self.last_modified_enabled, self.created_enabled);
        self.last_modified_enabled = lm;
        self.created_enabled = c;
    }
}

/// 点击循环：(最后修改, 创建) 的四状态转移
pub fn next_cycle_state(last_modified: bool, created: bool) -> (bool, bool) {
    match (last_modified, created) {
        (true, true) => (true, false),
        (true, false) => (false, true),
        (false, true) => (true, true),
        (false, false) => (true, false),
    }
}

/// 解析设置面板输入的刷新间隔（秒）
pub fn parse_refresh_interval(input: &str) -> Result<Duration, AppError> {
    let secs: f64 = input
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidInterval(input.to_string()))?;
    if !secs.is_finite() {
        return Err(AppError::InvalidInterval(input.to_string()));
    }
    Ok(clamp_interval_secs(secs))
}

fn clamp_interval_secs(secs: f64) -> Duration {
    if !secs.is_finite() || secs <= MIN_REFRESH_INTERVAL.as_secs_f64() {
        return MIN_REFRESH_INTERVAL;
    }
    if secs >= MAX_REFRESH_INTERVAL.as_secs_f64() {
        return MAX_REFRESH_INTERVAL;
    }
    Duration::from_secs_f64(secs)
}

fn same_json_kind(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Bool(_), Value::Bool(_))
            | (Value::String(_), Value::String(_))
            | (Value::Number(_), Value::Number(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_keeps_defaults_for_missing_fields() {
        let persisted = json!({ "createdTimestampFormat": "YYYY" });
        let settings = Settings::merge_with_defaults(Some(&persisted));

        assert_eq!(settings.created_timestamp_format, "YYYY");
        assert_eq!(settings.created_prepend, DEFAULT_CREATED_PREPEND);
        assert_eq!(settings.last_modified_prepend, DEFAULT_LAST_MODIFIED_PREPEND);
        assert_eq!(settings.last_modified_timestamp_format, DEFAULT_TIMESTAMP_FORMAT);
        assert!(settings.created_enabled);
        assert!(!settings.cycle_on_click_enabled);
        assert_eq!(settings.refresh_interval, DEFAULT_REFRESH_INTERVAL_SECS);
    }

    #[test]
    fn test_merge_without_persisted_data() {
        assert_eq!(Settings::merge_with_defaults(None), Settings::default());
    }

    #[test]
    fn test_merge_ignores_wrong_types_and_unknown_fields() {
        let persisted = json!({
            "createdEnabled": "yes",
            "lastModifiedPrepend": "改于 ",
            "somethingElse": 42
        });
        let settings = Settings::merge_with_defaults(Some(&persisted));

        // 类型不符的字段保留默认值
        assert!(settings.created_enabled);
        assert_eq!(settings.last_modified_prepend, "改于 ");
    }

    #[test]
    fn test_merge_non_object_falls_back_to_defaults() {
        let persisted = json!([1, 2, 3]);
        assert_eq!(Settings::merge_with_defaults(Some(&persisted)), Settings::default());
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "createdEnabled",
            "createdPrepend",
            "createdTimestampFormat",
            "lastModifiedEnabled",
            "lastModifiedPrepend",
            "lastModifiedTimestampFormat",
            "cycleOnClickEnabled",
            "refreshInterval",
        ] {
            assert!(obj.contains_key(key), "缺少字段 {}", key);
        }
    }

    #[test]
    fn test_cycle_returns_to_start_after_three_clicks() {
        let mut state = (true, true);
        let mut seen = Vec::new();
        for _ in 0..3 {
            state = next_cycle_state(state.0, state.1);
            seen.push(state);
        }
        assert_eq!(state, (true, true));
        assert_eq!(seen, vec![(true, false), (false, true), (true, true)]);
    }

    #[test]
    fn test_cycle_transition_table() {
        assert_eq!(next_cycle_state(true, true), (true, false));
        assert_eq!(next_cycle_state(true, false), (false, true));
        assert_eq!(next_cycle_state(false, true), (true, true));
        assert_eq!(next_cycle_state(false, false), (true, false));

        // 每个状态都有后继，且不会停留在原地
        for lm in [true, false] {
            for c in [true, false] {
                assert_ne!(next_cycle_state(lm, c), (lm, c));
            }
        }
    }

    #[test]
    fn test_cycle_handles_both_off() {
        assert_eq!(next_cycle_state(false, false), (true, false));

        let mut settings = Settings::default();
        settings.set_enabled(SlotKind::Created, false);
        settings.set_enabled(SlotKind::LastModified, false);
        settings.cycle_enabled();
        assert!(settings.last_modified_enabled);
        assert!(!settings.created_enabled);
    }

    #[test]
    fn test_parse_refresh_interval() {
        assert_eq!(parse_refresh_interval("2").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_refresh_interval(" 0.5 ").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_refresh_interval("0").unwrap(), MIN_REFRESH_INTERVAL);
        assert_eq!(parse_refresh_interval("-3").unwrap(), MIN_REFRESH_INTERVAL);
        assert_eq!(parse_refresh_interval("1e12").unwrap(), MAX_REFRESH_INTERVAL);

        assert!(matches!(parse_refresh_interval("abc"), Err(AppError::InvalidInterval(_))));
        assert!(matches!(parse_refresh_interval("NaN"), Err(AppError::InvalidInterval(_))));
        assert!(matches!(parse_refresh_interval(""), Err(AppError::InvalidInterval(_))));
    }

    #[test]
    fn test_persisted_interval_is_clamped() {
        let persisted = json!({ "refreshInterval": -1 });
        let settings = Settings::merge_with_defaults(Some(&persisted));
        assert_eq!(settings.refresh_interval(), MIN_REFRESH_INTERVAL);
    }

    #[test]
    fn test_apply_changes() {
        let mut settings = Settings::default();
        settings.apply(&SettingChange::Prepend(SlotKind::LastModified, "LM ".into()));
        settings.apply(&SettingChange::TimestampFormat(SlotKind::Created, "YY".into()));
        settings.apply(&SettingChange::CycleOnClick(true));
        settings.apply(&SettingChange::RefreshInterval(Duration::from_secs(5)));
        settings.apply(&SettingChange::Enabled(SlotKind::Created, false));

        assert_eq!(settings.prepend(SlotKind::LastModified), "LM ");
        assert_eq!(settings.timestamp_format(SlotKind::Created), "YY");
        assert!(settings.cycle_on_click_enabled);
        assert_eq!(settings.refresh_interval(), Duration::from_secs(5));
        assert!(!settings.enabled(SlotKind::Created));
    }
}
