use serde::{Deserialize, Serialize};

/// 调用方在外部身份系统中的角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActorRole {
    #[serde(rename = "reporter")]
    Reporter,
    #[serde(rename = "worker")]
    Worker,
    #[serde(rename = "authority")]
    Authority,
}

/// 显式传入每个操作的调用方身份，由外部认证服务签发的会话得到
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub display_name: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, role: ActorRole) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role,
        }
    }

    pub fn reporter(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(id, display_name, ActorRole::Reporter)
    }

    pub fn worker(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), id, ActorRole::Worker)
    }

    pub fn authority(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), id, ActorRole::Authority)
    }
}
