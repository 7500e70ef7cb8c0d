use serde::{Deserialize, Serialize};

/// 场所，按 (name, floor) 去重
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub floor: i32,
}

impl Place {
    pub fn new(name: impl Into<String>, floor: i32) -> Self {
        Self {
            id: 0, // 将由存储生成
            name: name.into(),
            floor,
        }
    }

    /// 去重键：名称去除首尾空白后与楼层组合
    pub fn key(&self) -> (String, i32) {
        (self.name.trim().to_string(), self.floor)
    }

    pub fn entity_description(&self) -> String {
        format!("场所 '{}' {}楼 (ID: {})", self.name, self.floor, self.id)
    }
}
